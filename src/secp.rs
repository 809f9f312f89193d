//! secp256k1 scalars and points.
//!
//! [`Scalar`] is always in `[1, n)` and [`Point`] is never the point at
//! infinity. Every constructor enforces this, so any value of either type is
//! safe to serialize and hand to the protocol functions.

use crate::error::{Error, Result};
use crate::utils::strip_hex_prefix;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::ff::PrimeField;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::subtle::ConstantTimeEq;
use k256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Neg;
use std::str::FromStr;

pub const SCALAR_LENGTH: usize = 32;
pub const COMPRESSED_POINT_LENGTH: usize = 33; // Y-Parity || X
pub const UNCOMPRESSED_POINT_LENGTH: usize = 65; // 0x04 || X || Y
pub const RAW_POINT_LENGTH: usize = 64; // X || Y

/// Order of the secp256k1 group, big endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

pub fn curve_order() -> BigUint {
    BigUint::from_bytes_be(&CURVE_ORDER)
}

/// A private exponent, blinding factor or signing key.
#[derive(Clone, Copy)]
pub struct Scalar(NonZeroScalar);

impl Scalar {
    /// Draws a uniformly random non-zero scalar.
    pub fn random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self(NonZeroScalar::random(rng))
    }

    /// Parses 32 big endian bytes, rejecting zero and values `>= n`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SCALAR_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidScalar(format!(
                "expected {} bytes, got {}",
                SCALAR_LENGTH,
                bytes.len()
            ))
        })?;
        let scalar: Option<k256::Scalar> = k256::Scalar::from_repr(FieldBytes::from(bytes)).into();
        let scalar =
            scalar.ok_or_else(|| Error::InvalidScalar("value is not below the curve order".into()))?;
        Self::from_k256(scalar)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| Error::InvalidScalar(format!("bad hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value.bits() > 8 * SCALAR_LENGTH as u64 {
            return Err(Error::InvalidScalar("value exceeds 256 bits".into()));
        }
        let be = value.to_bytes_be();
        let mut bytes = [0u8; SCALAR_LENGTH];
        bytes[SCALAR_LENGTH - be.len()..].copy_from_slice(&be);
        Self::from_bytes(&bytes)
    }

    pub fn from_u64(value: u64) -> Result<Self> {
        Self::from_biguint(&BigUint::from(value))
    }

    pub(crate) fn from_k256(scalar: k256::Scalar) -> Result<Self> {
        let scalar: Option<NonZeroScalar> = NonZeroScalar::new(scalar).into();
        scalar
            .map(Self)
            .ok_or_else(|| Error::InvalidScalar("value is zero".into()))
    }

    pub(crate) fn as_k256(&self) -> k256::Scalar {
        *self.0
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_LENGTH] {
        let repr = self.0.to_repr();
        let mut out = [0u8; SCALAR_LENGTH];
        out.copy_from_slice(&repr);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_bytes())
    }

    /// `self·G`
    pub fn public_key(&self) -> Point {
        Point((ProjectivePoint::GENERATOR * self.as_k256()).to_affine())
    }

    /// `(self + other) mod n`, failing if the sum is zero.
    pub fn add(&self, other: &Scalar) -> Result<Scalar> {
        Self::from_k256(self.as_k256() + other.as_k256())
    }

    /// `(self · other) mod n`
    pub fn mul(&self, other: &Scalar) -> Result<Scalar> {
        Self::from_k256(self.as_k256() * other.as_k256())
    }

    /// ECDSA over `SHA256(message)` with an RFC 6979 nonce, DER encoded.
    /// The signature is normalized to low S.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::from(self.0);
        let signature: Signature = signing_key
            .try_sign(message)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Scalar {}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scalar(..)")
    }
}

impl TryFrom<&[u8]> for Scalar {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        Self::from_bytes(b)
    }
}

impl TryFrom<[u8; 32]> for Scalar {
    type Error = Error;

    fn try_from(b: [u8; 32]) -> Result<Self> {
        Self::from_bytes(&b)
    }
}

impl FromStr for Scalar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A point on secp256k1 other than the identity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Point(AffinePoint);

impl Point {
    pub fn generator() -> Self {
        Self(AffinePoint::GENERATOR)
    }

    /// Parses a compressed (33 byte) or uncompressed (65 byte) SEC1 encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match (bytes.len(), bytes.first().copied()) {
            (COMPRESSED_POINT_LENGTH, Some(0x02 | 0x03)) => {}
            (UNCOMPRESSED_POINT_LENGTH, Some(0x04)) => {}
            (len, _) => {
                return Err(Error::InvalidPoint(format!(
                    "unrecognised encoding of {} bytes",
                    len
                )))
            }
        }
        let encoded =
            EncodedPoint::from_bytes(bytes).map_err(|e| Error::InvalidPoint(e.to_string()))?;
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        match affine {
            Some(p) if p != AffinePoint::IDENTITY => Ok(Self(p)),
            _ => Err(Error::InvalidPoint("not on the curve".into())),
        }
    }

    /// Parses 64 bytes holding the affine `x || y` coordinates.
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RAW_POINT_LENGTH {
            return Err(Error::InvalidPoint(format!(
                "raw encoding must be {} bytes, got {}",
                RAW_POINT_LENGTH,
                bytes.len()
            )));
        }
        let mut uncompressed = [0u8; UNCOMPRESSED_POINT_LENGTH];
        uncompressed[0] = 0x04;
        uncompressed[1..].copy_from_slice(bytes);
        Self::from_bytes(&uncompressed)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| Error::InvalidPoint(format!("bad hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_projective(p: ProjectivePoint) -> Result<Self> {
        if p == ProjectivePoint::IDENTITY {
            return Err(Error::InvalidPoint("point at infinity".into()));
        }
        Ok(Self(p.to_affine()))
    }

    fn to_projective(self) -> ProjectivePoint {
        ProjectivePoint::from(self.0)
    }

    pub fn to_bytes(&self, compressed: bool) -> Vec<u8> {
        self.0.to_encoded_point(compressed).as_bytes().to_vec()
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_POINT_LENGTH] {
        let mut out = [0u8; COMPRESSED_POINT_LENGTH];
        out.copy_from_slice(self.0.to_encoded_point(true).as_bytes());
        out
    }

    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LENGTH] {
        let mut out = [0u8; UNCOMPRESSED_POINT_LENGTH];
        out.copy_from_slice(self.0.to_encoded_point(false).as_bytes());
        out
    }

    pub fn to_raw(&self) -> [u8; RAW_POINT_LENGTH] {
        let mut out = [0u8; RAW_POINT_LENGTH];
        out.copy_from_slice(&self.to_uncompressed()[1..]);
        out
    }

    pub fn to_hex(&self, compressed: bool) -> String {
        hex::encode(self.to_bytes(compressed))
    }

    /// `self + other`, failing when `other == -self`.
    pub fn add(&self, other: &Point) -> Result<Point> {
        Self::from_projective(self.to_projective() + other.to_projective())
    }

    /// `self - other`, failing when `other == self`.
    pub fn sub(&self, other: &Point) -> Result<Point> {
        self.add(&other.neg())
    }

    /// `scalar · self`
    pub fn mul(&self, scalar: &Scalar) -> Point {
        // prime order group: a non-zero multiple of a non-identity point is never the identity
        Self((self.to_projective() * scalar.as_k256()).to_affine())
    }

    /// `self + scalar·G`
    pub fn tweak_add(&self, scalar: &Scalar) -> Result<Point> {
        self.add(&scalar.public_key())
    }

    /// Sum of all `points`.
    pub fn combine(points: &[Point]) -> Result<Point> {
        if points.is_empty() {
            return Err(Error::EmptyPointSet);
        }
        let sum = points
            .iter()
            .fold(ProjectivePoint::IDENTITY, |acc, p| acc + p.to_projective());
        Self::from_projective(sum)
    }

    /// Checks a DER encoded ECDSA signature over `SHA256(message)`.
    /// Malformed signatures are rejected, not reported as errors.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_affine(self.0) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(signature) else {
            return false;
        };
        verifying_key.verify(message, &signature).is_ok()
    }
}

impl Neg for Point {
    type Output = Point;

    // flips the parity of y
    fn neg(self) -> Point {
        Point(-self.0)
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_compressed().cmp(&other.to_compressed())
    }
}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_compressed().hash(state)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.to_hex(true))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex(true))
    }
}

impl TryFrom<&[u8]> for Point {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        Self::from_bytes(b)
    }
}

impl FromStr for Point {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex(true))
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
