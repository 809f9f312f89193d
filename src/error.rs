use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = BdhkeError> = std::result::Result<T, E>;
pub type Error = BdhkeError;

#[derive(Error, Debug)]
/// error variants.
pub enum BdhkeError {
    #[error("invalid scalar: {0}")]
    InvalidScalar(String),

    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("hash to curve found no valid point")]
    HashToCurveExhausted,

    #[error("invalid derivation path: {0}")]
    DerivationPathInvalid(String),

    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("dleq proof carries no blinding factor")]
    MissingBlindingFactor,

    #[error("cannot combine an empty set of points")]
    EmptyPointSet,

    #[error("ecdsa signing failed: {0}")]
    Signing(String),

    #[error("invalid hmac key length")]
    InvalidKeyLength,

    #[error("fee reserve can't be negative: {0}")]
    NegativeFeeReserve(i64),

    #[error("mnemonic error")]
    Mnemonic(#[from] bip39::Error),
}
