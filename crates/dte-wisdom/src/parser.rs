//! A small structured parser for `KEY: value` provider replies (§9
//! design notes): clamping and fallback-to-default, never regex.

use dte_types::WisdomDomain;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWisdom {
    pub content: String,
    pub domain: WisdomDomain,
    pub depth: f32,
}

const DEFAULT_DEPTH: f32 = 0.5;

/// Parses lines of the form `WISDOM: ...`, `DOMAIN: ...`, `DEPTH: ...` in
/// any order. Missing or unparsable fields fall back to sane defaults
/// rather than failing the whole synthesis.
pub fn parse_wisdom_reply(text: &str) -> ParsedWisdom {
    let mut content = String::new();
    let mut domain = WisdomDomain::Integration;
    let mut depth = DEFAULT_DEPTH;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_uppercase().as_str() {
            "WISDOM" => content = value.to_string(),
            "DOMAIN" => domain = WisdomDomain::parse_or_default(value),
            "DEPTH" => {
                if let Ok(parsed) = value.parse::<f32>() {
                    depth = parsed.clamp(0.0, 1.0);
                }
            }
            _ => {}
        }
    }

    if content.is_empty() {
        content = text.trim().to_string();
    }

    ParsedWisdom { content, domain, depth }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let text = "WISDOM: patience compounds\nDOMAIN: resilience\nDEPTH: 0.8";
        let parsed = parse_wisdom_reply(text);
        assert_eq!(parsed.content, "patience compounds");
        assert_eq!(parsed.domain, WisdomDomain::Resilience);
        assert_eq!(parsed.depth, 0.8);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed = parse_wisdom_reply("just some free text with no structure");
        assert_eq!(parsed.domain, WisdomDomain::Integration);
        assert_eq!(parsed.depth, DEFAULT_DEPTH);
        assert!(!parsed.content.is_empty());
    }

    #[test]
    fn out_of_range_depth_is_clamped() {
        let parsed = parse_wisdom_reply("WISDOM: x\nDOMAIN: learning\nDEPTH: 4.2");
        assert_eq!(parsed.depth, 1.0);
    }

    #[test]
    fn unparseable_depth_keeps_default() {
        let parsed = parse_wisdom_reply("WISDOM: x\nDOMAIN: learning\nDEPTH: not-a-number");
        assert_eq!(parsed.depth, DEFAULT_DEPTH);
    }
}
