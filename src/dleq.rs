//! Discrete log equality proofs binding a blinded signature to a mint key.
//!
//! The mint proves that `C' = a·B'` uses the same `a` as its public key
//! `A = a·G`, without revealing `a`:
//!
//! ```text
//! R1 = p·G, R2 = p·B'
//! e  = SHA256(hex(R1) || hex(R2) || hex(A) || hex(C'))   (uncompressed hex)
//! s  = p + e·a
//! ```
//!
//! Anyone holding `B'`, `C'` and `A` can check it with [`verify_blinded`].
//! A holder who has unblinded the signature can check it from the secret,
//! the blinding factor and `C` with [`verify_unblinded`].

use crate::error::{Error, Result};
use crate::hash_to_curve::HashToCurve;
use crate::policy::VerificationPolicy;
use crate::secp::{Point, Scalar};
use crate::utils::sha256;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Fiat-Shamir transcript `(e, s)`.
///
/// `r` is only present in the holder's copy, where it lets a third party
/// check the proof against the unblinded signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    pub e: Scalar,
    pub s: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<Scalar>,
}

impl DleqProof {
    pub fn with_blinding_factor(self, r: Scalar) -> Self {
        Self { r: Some(r), ..self }
    }

    /// [`verify_unblinded`] using the blinding factor carried by this proof.
    pub fn verify_unblinded(&self, secret: &[u8], c: &Point, mint_pubkey: &Point) -> Result<bool> {
        let r = self.r.as_ref().ok_or(Error::MissingBlindingFactor)?;
        verify_unblinded(secret, r, c, self, mint_pubkey)
    }
}

/// The challenge hash over the uncompressed hex encodings of the four points.
pub fn hash_e(r1: &Point, r2: &Point, a: &Point, c_: &Point) -> [u8; 32] {
    let mut e_string = String::with_capacity(4 * 130);
    for p in [r1, r2, a, c_] {
        e_string.push_str(&p.to_hex(false));
    }
    sha256(e_string.as_bytes())
}

/// Proves that `a·blinded_msg` was computed with the scalar behind `a·G`.
///
/// `nonce` fixes `p` for reproducible proofs; otherwise it is drawn from `rng`.
pub fn generate<R: CryptoRng + RngCore>(
    blinded_msg: &Point,
    a: &Scalar,
    nonce: Option<Scalar>,
    rng: &mut R,
) -> Result<DleqProof> {
    let p = nonce.unwrap_or_else(|| Scalar::random(rng));

    let r1 = p.public_key();
    let r2 = blinded_msg.mul(&p);
    let c_ = blinded_msg.mul(a);
    let mint_pubkey = a.public_key();

    let e = Scalar::from_bytes(&hash_e(&r1, &r2, &mint_pubkey, &c_))?;
    let s = p.add(&a.mul(&e)?)?;

    Ok(DleqProof { e, s, r: None })
}

/// Checks `proof` against the blinded message and blinded signature.
pub fn verify_blinded(
    blinded_msg: &Point,
    blinded_sig: &Point,
    proof: &DleqProof,
    mint_pubkey: &Point,
) -> bool {
    // R1 = s·G - e·A
    let Ok(r1) = proof.s.public_key().sub(&mint_pubkey.mul(&proof.e)) else {
        return false;
    };
    // R2 = s·B' - e·C'
    let Ok(r2) = blinded_msg.mul(&proof.s).sub(&blinded_sig.mul(&proof.e)) else {
        return false;
    };
    hash_e(&r1, &r2, mint_pubkey, blinded_sig) == proof.e.to_bytes()
}

/// Rebuilds `B'` and `C'` from the unblinded token and checks `proof`,
/// falling back to the legacy hash-to-curve per the default policy.
pub fn verify_unblinded(
    secret: &[u8],
    r: &Scalar,
    c: &Point,
    proof: &DleqProof,
    mint_pubkey: &Point,
) -> Result<bool> {
    verify_unblinded_with_policy(
        secret,
        r,
        c,
        proof,
        mint_pubkey,
        &VerificationPolicy::default(),
    )
}

pub fn verify_unblinded_with_policy(
    secret: &[u8],
    r: &Scalar,
    c: &Point,
    proof: &DleqProof,
    mint_pubkey: &Point,
    policy: &VerificationPolicy,
) -> Result<bool> {
    policy.check(|variant| verify_unblinded_with(variant, secret, r, c, proof, mint_pubkey))
}

/// [`verify_unblinded`] for tokens blinded with the legacy hash-to-curve only.
pub fn verify_unblinded_legacy(
    secret: &[u8],
    r: &Scalar,
    c: &Point,
    proof: &DleqProof,
    mint_pubkey: &Point,
) -> Result<bool> {
    verify_unblinded_with(HashToCurve::Legacy, secret, r, c, proof, mint_pubkey)
}

fn verify_unblinded_with(
    variant: HashToCurve,
    secret: &[u8],
    r: &Scalar,
    c: &Point,
    proof: &DleqProof,
    mint_pubkey: &Point,
) -> Result<bool> {
    let y = variant.hash(secret)?;
    // C' = C + r·A
    let Ok(blinded_sig) = c.add(&mint_pubkey.mul(r)) else {
        return Ok(false);
    };
    // B' = Y + r·G
    let Ok(blinded_msg) = y.add(&r.public_key()) else {
        return Ok(false);
    };
    Ok(verify_blinded(&blinded_msg, &blinded_sig, proof, mint_pubkey))
}
