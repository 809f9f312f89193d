//! Blind Diffie-Hellman key exchange over secp256k1.
//!
//! A holder blinds a secret, a mint signs it without learning it and proves
//! with a DLEQ proof which key it used, and the holder unblinds the result
//! into a signature the mint will later accept for that secret.

mod blind_sigs;
pub mod dleq;
mod error;
pub mod hash_to_curve;
pub mod helpers;
pub mod keys;
pub mod mnemonic;
mod policy;
pub mod secp;
mod utils;
mod version;

pub use crate::blind_sigs::{
    blind_message, blind_message_legacy, sign_blinded_message, unblind_signature, verify,
    verify_legacy, verify_with_policy, BlindedMessage, BlindedSignature, Secret,
};
pub use crate::dleq::DleqProof;
pub use crate::error::{BdhkeError, Error, Result};
pub use crate::hash_to_curve::{hash_to_curve, hash_to_curve_legacy, HashToCurve};
pub use crate::keys::{DerivationPath, ExtendedPrivateKey, Keyset, PrivateKeys, PublicKeys};
pub use crate::policy::VerificationPolicy;
pub use crate::secp::{curve_order, Point, Scalar};
pub use crate::version::{Generation, KeysetIdFormat, Version};
