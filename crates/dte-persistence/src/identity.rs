//! Stable identity: a signature computed once at birth and re-verified on
//! every restore.

use chrono::{DateTime, Utc};
use dte_types::Identity;
use sha2::{Digest, Sha256};

/// `sha256(core_values || wisdom_domains || birth_time)`, hex-encoded.
/// Domains are listed in their fixed declaration order so the signature
/// is independent of any runtime ordering.
pub fn compute_signature(core_values: &[String], birth_time: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    for value in core_values {
        hasher.update(value.as_bytes());
        hasher.update(b"\0");
    }
    for domain in canonical_domains() {
        hasher.update(domain.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(birth_time.to_rfc3339().as_bytes());
    hex::encode(hasher.finalize())
}

fn canonical_domains() -> [&'static str; 8] {
    [
        "self_knowledge",
        "learning",
        "relationships",
        "decision_making",
        "creativity",
        "resilience",
        "purpose",
        "integration",
    ]
}

/// Builds a fresh identity at first boot.
pub fn birth(core_values: Vec<String>) -> Identity {
    let birth_time = Utc::now();
    let signature = compute_signature(&core_values, birth_time);
    Identity {
        signature,
        birth_time,
        core_values,
    }
}

/// Recomputes `identity`'s signature and confirms it still matches the
/// stored one; a mismatch means the checkpoint was hand-edited or
/// corrupted.
pub fn verify(identity: &Identity) -> bool {
    compute_signature(&identity.core_values, identity.birth_time) == identity.signature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let birth_time = Utc::now();
        let values = vec!["curiosity".to_string(), "care".to_string()];
        let a = compute_signature(&values, birth_time);
        let b = compute_signature(&values, birth_time);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_changes_with_core_values() {
        let birth_time = Utc::now();
        let a = compute_signature(&["curiosity".to_string()], birth_time);
        let b = compute_signature(&["rigor".to_string()], birth_time);
        assert_ne!(a, b);
    }

    #[test]
    fn birth_produces_a_verifiable_identity() {
        let identity = birth(vec!["curiosity".to_string()]);
        assert!(verify(&identity));
    }

    #[test]
    fn tampered_identity_fails_verification() {
        let mut identity = birth(vec!["curiosity".to_string()]);
        identity.core_values.push("tampered".to_string());
        assert!(!verify(&identity));
    }
}
