use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

type HmacSha512 = Hmac<Sha512>;

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

// same as sha256(a || b || ...) without building the concatenation
pub(crate) fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub(crate) fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|_| Error::InvalidKeyLength)?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();

    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    Ok(out)
}

// Accepts an optional 0x prefix, like the hex strings stored in token records.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn concat_matches_single_buffer() {
        let joined = [b"Secp256k1_".as_slice(), b"HashToCurve"].concat();
        assert_eq!(
            sha256(&joined),
            sha256_concat(&[b"Secp256k1_", b"HashToCurve"])
        );
    }

    #[test]
    fn hmac_sha512_rfc4231_case_2() -> Result<()> {
        let mac = hmac_sha512(b"Jefe", b"what do ya want for nothing?")?;
        assert_eq!(
            hex::encode(mac),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
        Ok(())
    }

    #[test]
    fn hex_prefix_is_optional() {
        assert_eq!(strip_hex_prefix("0xabcd"), "abcd");
        assert_eq!(strip_hex_prefix("abcd"), "abcd");
    }
}
