use crate::dleq::{self, DleqProof};
use crate::error::Result;
use crate::hash_to_curve::HashToCurve;
use crate::policy::VerificationPolicy;
use crate::secp::{Point, Scalar};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Represents the secret a token is minted for.
/// The holder keeps it hidden from the mint until redemption.
pub type Secret = Vec<u8>;

/// `B' = Y + r·G`, sent to the mint, together with
/// the blinding factor `r` that the holder keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlindedMessage {
    blinded_msg: Point,
    blinding_factor: Scalar,
}

impl BlindedMessage {
    pub fn blinded_msg(&self) -> Point {
        self.blinded_msg
    }

    pub fn blinding_factor(&self) -> Scalar {
        self.blinding_factor
    }
}

impl From<(Point, Scalar)> for BlindedMessage {
    fn from(t: (Point, Scalar)) -> Self {
        Self {
            blinded_msg: t.0,
            blinding_factor: t.1,
        }
    }
}

/// The mint's answer to a BlindedMessage: `C' = a·B'`
/// plus a proof that `a` is the key behind its public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedSignature {
    #[serde(rename = "C_")]
    pub blinded_sig: Point,
    pub dleq: DleqProof,
}

impl BlindedSignature {
    pub fn verify_dleq(&self, blinded_msg: &Point, mint_pubkey: &Point) -> bool {
        dleq::verify_blinded(blinded_msg, &self.blinded_sig, &self.dleq, mint_pubkey)
    }

    /// The signature on the secret itself, `C = C' - r·A`.
    pub fn signature_for_secret(&self, blinding_factor: &Scalar, mint_pubkey: &Point) -> Result<Point> {
        unblind_signature(&self.blinded_sig, blinding_factor, mint_pubkey)
    }

    /// The holder's copy of the proof, which can be checked against the
    /// unblinded signature.
    pub fn dleq_for_secret(&self, blinding_factor: Scalar) -> DleqProof {
        self.dleq.clone().with_blinding_factor(blinding_factor)
    }
}

/// Holder side: `Y = hash_to_curve(secret)`, `B' = Y + r·G`.
///
/// `blinding_factor` fixes `r` (for deterministic restores and tests);
/// otherwise it is drawn from `rng`.
pub fn blind_message<R: CryptoRng + RngCore>(
    secret: &[u8],
    blinding_factor: Option<Scalar>,
    rng: &mut R,
) -> Result<BlindedMessage> {
    blind_message_with(HashToCurve::DomainSeparated, secret, blinding_factor, rng)
}

/// [`blind_message`] using the legacy hash-to-curve, for reproducing tokens
/// issued before domain separation.
pub fn blind_message_legacy<R: CryptoRng + RngCore>(
    secret: &[u8],
    blinding_factor: Option<Scalar>,
    rng: &mut R,
) -> Result<BlindedMessage> {
    blind_message_with(HashToCurve::Legacy, secret, blinding_factor, rng)
}

fn blind_message_with<R: CryptoRng + RngCore>(
    variant: HashToCurve,
    secret: &[u8],
    blinding_factor: Option<Scalar>,
    rng: &mut R,
) -> Result<BlindedMessage> {
    let y = variant.hash(secret)?;
    let r = blinding_factor.unwrap_or_else(|| Scalar::random(rng));
    let blinded_msg = y.add(&r.public_key())?;

    Ok(BlindedMessage::from((blinded_msg, r)))
}

/// Mint side: `C' = a·B'` with a DLEQ proof for `A = a·G`.
///
/// `nonce` fixes the proof nonce; otherwise it is drawn from `rng`.
pub fn sign_blinded_message<R: CryptoRng + RngCore>(
    blinded_msg: &Point,
    a: &Scalar,
    nonce: Option<Scalar>,
    rng: &mut R,
) -> Result<BlindedSignature> {
    let blinded_sig = blinded_msg.mul(a);
    let dleq = dleq::generate(blinded_msg, a, nonce, rng)?;

    Ok(BlindedSignature { blinded_sig, dleq })
}

/// Holder side: `C = C' - r·A`.
pub fn unblind_signature(blinded_sig: &Point, r: &Scalar, mint_pubkey: &Point) -> Result<Point> {
    blinded_sig.sub(&mint_pubkey.mul(r))
}

/// Mint side: accepts iff `C == a·hash_to_curve(secret)`, retrying with the
/// legacy hash-to-curve before rejecting.
pub fn verify(a: &Scalar, c: &Point, secret: &[u8]) -> Result<bool> {
    verify_with_policy(a, c, secret, &VerificationPolicy::default())
}

pub fn verify_with_policy(
    a: &Scalar,
    c: &Point,
    secret: &[u8],
    policy: &VerificationPolicy,
) -> Result<bool> {
    policy.check(|variant| verify_with(variant, a, c, secret))
}

/// [`verify`] for tokens blinded with the legacy hash-to-curve only.
pub fn verify_legacy(a: &Scalar, c: &Point, secret: &[u8]) -> Result<bool> {
    verify_with(HashToCurve::Legacy, a, c, secret)
}

fn verify_with(variant: HashToCurve, a: &Scalar, c: &Point, secret: &[u8]) -> Result<bool> {
    let y = variant.hash(secret)?;
    Ok(*c == y.mul(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_to_curve::{hash_to_curve, hash_to_curve_legacy};
    use rand::rngs::{OsRng, StdRng};
    use rand::SeedableRng;

    fn one() -> Scalar {
        Scalar::from_u64(1).unwrap()
    }

    #[test]
    fn single_signer() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let mint_key = Scalar::try_from(*b"********************************")?;
        let mint_pubkey = mint_key.public_key();

        let secret: Secret = b"407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837".to_vec();
        let blinded = blind_message(&secret, None, &mut rng)?;

        let signed = sign_blinded_message(&blinded.blinded_msg(), &mint_key, None, &mut rng)?;
        assert!(signed.verify_dleq(&blinded.blinded_msg(), &mint_pubkey));

        let c = signed.signature_for_secret(&blinded.blinding_factor(), &mint_pubkey)?;
        assert_eq!(c, hash_to_curve(&secret)?.mul(&mint_key));
        assert!(verify(&mint_key, &c, &secret)?);

        let proof = signed.dleq_for_secret(blinded.blinding_factor());
        assert!(proof.verify_unblinded(&secret, &c, &mint_pubkey)?);

        Ok(())
    }

    #[test]
    fn unit_blinding_factor_adds_generator() -> Result<()> {
        let blinded = blind_message(b"test_message", Some(one()), &mut OsRng)?;
        let expected = hash_to_curve(b"test_message")?.add(&Point::generator())?;
        assert_eq!(blinded.blinded_msg(), expected);
        assert_eq!(blinded.blinding_factor(), one());
        Ok(())
    }

    #[test]
    fn unit_key_signs_to_the_blinded_message() -> Result<()> {
        let blinded = blind_message(b"test_message", Some(one()), &mut OsRng)?;
        let signed = sign_blinded_message(&blinded.blinded_msg(), &one(), Some(one()), &mut OsRng)?;
        assert_eq!(signed.blinded_sig, blinded.blinded_msg());
        Ok(())
    }

    #[test]
    fn round_trip_for_random_keys() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(9);
        for i in 0..8u32 {
            let secret = format!("secret-{}", i);
            let a = Scalar::random(&mut rng);
            let blinded = blind_message(secret.as_bytes(), None, &mut rng)?;
            let signed = sign_blinded_message(&blinded.blinded_msg(), &a, None, &mut rng)?;
            let c = unblind_signature(&signed.blinded_sig, &blinded.blinding_factor(), &a.public_key())?;
            assert_eq!(c, hash_to_curve(secret.as_bytes())?.mul(&a));
            assert!(verify(&a, &c, secret.as_bytes())?);
        }
        Ok(())
    }

    #[test]
    fn rejects_wrong_secret_or_key() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(10);
        let a = Scalar::random(&mut rng);
        let other = Scalar::random(&mut rng);
        let blinded = blind_message(b"mine", None, &mut rng)?;
        let signed = sign_blinded_message(&blinded.blinded_msg(), &a, None, &mut rng)?;
        let c = signed.signature_for_secret(&blinded.blinding_factor(), &a.public_key())?;

        assert!(!verify(&a, &c, b"not mine")?);
        assert!(!verify(&other, &c, b"mine")?);
        Ok(())
    }

    #[test]
    fn legacy_tokens_need_the_fallback() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        let a = Scalar::random(&mut rng);
        let secret = b"minted long ago";

        let blinded = blind_message_legacy(secret, None, &mut rng)?;
        let signed = sign_blinded_message(&blinded.blinded_msg(), &a, None, &mut rng)?;
        let c = signed.signature_for_secret(&blinded.blinding_factor(), &a.public_key())?;

        assert_eq!(c, hash_to_curve_legacy(secret)?.mul(&a));
        assert!(verify(&a, &c, secret)?);
        assert!(verify_legacy(&a, &c, secret)?);
        assert!(!verify_with_policy(&a, &c, secret, &VerificationPolicy::STRICT)?);
        Ok(())
    }

    #[test]
    fn current_tokens_fail_legacy_only_check() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(12);
        let a = Scalar::random(&mut rng);
        let c = hash_to_curve(b"new")?.mul(&a);
        assert!(verify_with_policy(&a, &c, b"new", &VerificationPolicy::STRICT)?);
        assert!(!verify_legacy(&a, &c, b"new")?);
        Ok(())
    }

    #[test]
    fn blinded_signature_json_field_names() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(13);
        let a = Scalar::random(&mut rng);
        let blinded = blind_message(b"json", None, &mut rng)?;
        let signed = sign_blinded_message(&blinded.blinded_msg(), &a, None, &mut rng)?;

        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["C_"], signed.blinded_sig.to_hex(true));
        assert_eq!(json["dleq"]["s"], signed.dleq.s.to_hex());
        Ok(())
    }

    #[test]
    fn blinded_message_matches_reference_vector() -> Result<()> {
        let blinded = blind_message(b"test_message", Some(one()), &mut OsRng)?;
        assert_eq!(
            blinded.blinded_msg().to_hex(true),
            "025cc16fe33b953e2ace39653efb3e7a7049711ae1d8a2f7a9108753f1cdea742b"
        );
        Ok(())
    }
}
