use crate::error::Result;
use crate::hash_to_curve::HashToCurve;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How verification treats tokens blinded before domain separated
/// hash-to-curve existed.
///
/// This is the only place the legacy fallback is switched. With the fallback
/// on, a failed check against the current map is retried once with the
/// legacy map before the token is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    pub legacy_hash_to_curve_fallback: bool,
}

impl VerificationPolicy {
    /// Accepts only tokens blinded with the current map.
    pub const STRICT: Self = Self {
        legacy_hash_to_curve_fallback: false,
    };

    pub const COMPATIBLE: Self = Self {
        legacy_hash_to_curve_fallback: true,
    };

    /// Maps to try, in order.
    pub fn hash_to_curve_attempts(&self) -> &'static [HashToCurve] {
        if self.legacy_hash_to_curve_fallback {
            &[HashToCurve::DomainSeparated, HashToCurve::Legacy]
        } else {
            &[HashToCurve::DomainSeparated]
        }
    }

    /// Runs `check` against each allowed map until one accepts.
    pub(crate) fn check<F>(&self, mut check: F) -> Result<bool>
    where
        F: FnMut(HashToCurve) -> Result<bool>,
    {
        for (attempt, &variant) in self.hash_to_curve_attempts().iter().enumerate() {
            if check(variant)? {
                if attempt > 0 {
                    debug!(?variant, "accepted by fallback hash_to_curve");
                }
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::COMPATIBLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_on_by_default() {
        assert_eq!(
            VerificationPolicy::default().hash_to_curve_attempts(),
            &[HashToCurve::DomainSeparated, HashToCurve::Legacy]
        );
        assert_eq!(
            VerificationPolicy::STRICT.hash_to_curve_attempts(),
            &[HashToCurve::DomainSeparated]
        );
    }

    #[test]
    fn check_stops_at_first_accepting_map() -> Result<()> {
        let mut seen = Vec::new();
        let accepted = VerificationPolicy::default().check(|variant| {
            seen.push(variant);
            Ok(true)
        })?;
        assert!(accepted);
        assert_eq!(seen, vec![HashToCurve::DomainSeparated]);

        let mut seen = Vec::new();
        let accepted = VerificationPolicy::STRICT.check(|variant| {
            seen.push(variant);
            Ok(false)
        })?;
        assert!(!accepted);
        assert_eq!(seen, vec![HashToCurve::DomainSeparated]);
        Ok(())
    }

    #[test]
    fn deserializes_with_defaults() {
        let policy: VerificationPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, VerificationPolicy::COMPATIBLE);

        let policy: VerificationPolicy =
            serde_json::from_str(r#"{"legacy_hash_to_curve_fallback": false}"#).unwrap();
        assert_eq!(policy, VerificationPolicy::STRICT);
    }
}
