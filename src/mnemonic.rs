//! BIP-39 mnemonics as the seed source for current-generation keysets.

use crate::error::Result;
use bip39::{Language, Mnemonic};
use rand::{CryptoRng, RngCore};

pub const DEFAULT_WORD_COUNT: usize = 12;

/// Encodes 16 to 32 bytes of entropy (a multiple of 4) as English words.
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<String> {
    Ok(Mnemonic::from_entropy_in(Language::English, entropy)?.to_string())
}

/// Decodes a mnemonic back to its entropy, checking the checksum.
pub fn mnemonic_to_entropy(mnemonic: &str) -> Result<Vec<u8>> {
    Ok(parse(mnemonic)?.to_entropy())
}

pub fn validate_mnemonic(mnemonic: &str) -> bool {
    parse(mnemonic).is_ok()
}

/// A fresh mnemonic of 12, 15, 18, 21 or 24 words.
pub fn generate_mnemonic<R: CryptoRng + RngCore>(word_count: usize, rng: &mut R) -> Result<String> {
    if word_count < 12 || word_count > 24 || word_count % 3 != 0 {
        return Err(bip39::Error::BadWordCount(word_count).into());
    }
    let mut entropy = vec![0u8; word_count / 3 * 4];
    rng.fill_bytes(&mut entropy);
    entropy_to_mnemonic(&entropy)
}

/// The bytes keys are derived from. No PBKDF2 stretching is applied: the
/// normalized phrase itself is the HD seed.
pub fn mnemonic_seed(mnemonic: &str) -> Result<Vec<u8>> {
    Ok(parse(mnemonic)?.to_string().into_bytes())
}

fn parse(mnemonic: &str) -> Result<Mnemonic> {
    Ok(Mnemonic::parse_in_normalized(Language::English, mnemonic.trim())?)
}
