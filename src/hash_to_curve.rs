//! Deterministic maps from arbitrary bytes to secp256k1 points.
//!
//! The domain separated map is the one new tokens are issued under. The
//! legacy map predates it and only exists so that verification can still
//! accept tokens blinded with it.

use crate::error::{Error, Result};
use crate::secp::{Point, COMPRESSED_POINT_LENGTH};
use crate::utils::{sha256, sha256_concat};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const DOMAIN_SEPARATOR: &[u8] = b"Secp256k1_HashToCurve_Cashu_";

/// Upper bound on candidate x coordinates tried by either map.
pub const MAX_ITERATIONS: u32 = 1 << 16;

/// Selects which hash-to-curve map to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashToCurve {
    #[default]
    DomainSeparated,
    Legacy,
}

impl HashToCurve {
    pub fn hash(self, message: &[u8]) -> Result<Point> {
        match self {
            Self::DomainSeparated => hash_to_curve(message),
            Self::Legacy => hash_to_curve_legacy(message),
        }
    }
}

/// `Y = 02 || SHA256(SHA256(DST || message) || counter_le32)` for the first
/// counter that lands on the curve.
pub fn hash_to_curve(message: &[u8]) -> Result<Point> {
    let msg_to_hash = sha256_concat(&[DOMAIN_SEPARATOR, message]);
    for counter in 0..MAX_ITERATIONS {
        let candidate = sha256_concat(&[&msg_to_hash, &counter.to_le_bytes()]);
        if let Some(point) = lift_even_x(&candidate) {
            trace!(counter, "hash_to_curve found point");
            return Ok(point);
        }
    }
    Err(Error::HashToCurveExhausted)
}

/// `Y = 02 || SHA256(message)`, rehashing the previous digest until it lands
/// on the curve.
pub fn hash_to_curve_legacy(message: &[u8]) -> Result<Point> {
    let mut candidate = sha256(message);
    for attempt in 0..MAX_ITERATIONS {
        if let Some(point) = lift_even_x(&candidate) {
            trace!(attempt, "legacy hash_to_curve found point");
            return Ok(point);
        }
        candidate = sha256(&candidate);
    }
    Err(Error::HashToCurveExhausted)
}

// The point with x coordinate `x` and even y, if x is on the curve.
fn lift_even_x(x: &[u8; 32]) -> Option<Point> {
    let mut compressed = [0u8; COMPRESSED_POINT_LENGTH];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(x);
    Point::from_bytes(&compressed).ok()
}
