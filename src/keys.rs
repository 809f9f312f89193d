//! Mint key derivation and keyset identifiers.
//!
//! A mint derives one private scalar per denomination from a seed. Which
//! algorithm applies depends on the [`Generation`] the keyset was created
//! under; all three stay available so old keysets can be reproduced.

use crate::error::{Error, Result};
use crate::secp::{Point, Scalar};
use crate::utils::{hmac_sha512, sha256, sha256_concat};
use crate::version::{Generation, KeysetIdFormat, Version};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, U256};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const HARDENED_OFFSET: u32 = 1 << 31;

/// Denominations the pre-0.12 derivation always produces.
pub const LEGACY_AMOUNTS: [u64; 6] = [1, 2, 4, 8, 16, 32];

pub const KEYSET_ID_VERSION_PREFIX: &str = "00";

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";
const HEX_KEYSET_ID_DIGEST_CHARS: usize = 14;
const BASE64_KEYSET_ID_CHARS: usize = 12;
const RANDOM_HASH_BYTES: usize = 30;

/// Private scalar per amount.
pub type PrivateKeys = BTreeMap<u64, Scalar>;
/// Public point per amount.
pub type PublicKeys = BTreeMap<u64, Point>;

/// A BIP-32 path such as `m/0'/0'/0'`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    indices: Vec<u32>,
}

impl DerivationPath {
    pub fn master() -> Self {
        Self::default()
    }

    /// Child indices, hardened ones with [`HARDENED_OFFSET`] set.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Matches `^m(/\d+'?)*$`.
    pub fn is_valid(path: &str) -> bool {
        path.parse::<Self>().is_ok()
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| Error::DerivationPathInvalid(format!("{:?}: {}", s, why));

        let rest = s.strip_prefix('m').ok_or_else(|| invalid("must start with 'm'"))?;
        if rest.is_empty() {
            return Ok(Self::master());
        }
        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| invalid("expected '/' after 'm'"))?;

        let mut indices = Vec::new();
        for segment in rest.split('/') {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("segments must be digits with an optional '"));
            }
            let index: u32 = digits.parse().map_err(|_| invalid("index too large"))?;
            if index >= HARDENED_OFFSET {
                return Err(invalid("index too large"));
            }
            indices.push(if hardened { index | HARDENED_OFFSET } else { index });
        }
        Ok(Self { indices })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &index in &self.indices {
            if index & HARDENED_OFFSET != 0 {
                write!(f, "/{}'", index & !HARDENED_OFFSET)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

/// A BIP-32 private key with its chain code.
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    private_key: Scalar,
    chain_code: [u8; 32],
}

impl ExtendedPrivateKey {
    /// Master key from `HMAC-SHA512("Bitcoin seed", seed)`.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let i = hmac_sha512(MASTER_HMAC_KEY, seed)?;
        Self::from_hmac_output(&i, |il| Scalar::from_bytes(il))
    }

    pub fn private_key(&self) -> Scalar {
        self.private_key
    }

    pub fn chain_code(&self) -> [u8; 32] {
        self.chain_code
    }

    /// One derivation step. Hardened indices hash `0x00 || k_par`, the others
    /// hash the compressed parent public key.
    pub fn derive_child(&self, index: u32) -> Result<Self> {
        let mut data = Vec::with_capacity(37);
        if index & HARDENED_OFFSET != 0 {
            data.push(0x00);
            data.extend_from_slice(&self.private_key.to_bytes());
        } else {
            data.extend_from_slice(&self.private_key.public_key().to_compressed());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let i = hmac_sha512(&self.chain_code, &data)?;
        Self::from_hmac_output(&i, |il| {
            // child = (parent + IL) mod n
            let mut il_bytes = [0u8; 32];
            il_bytes.copy_from_slice(il);
            let tweak = <k256::Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(il_bytes));
            Scalar::from_k256(self.private_key.as_k256() + tweak)
        })
    }

    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.indices()
            .iter()
            .try_fold(self.clone(), |key, &index| key.derive_child(index))
    }

    fn from_hmac_output<F>(i: &[u8; 64], private_key: F) -> Result<Self>
    where
        F: FnOnce(&[u8]) -> Result<Scalar>,
    {
        let (il, ir) = i.split_at(32);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);
        Ok(Self {
            private_key: private_key(il)?,
            chain_code,
        })
    }
}

/// Current derivation: the mnemonic's bytes are the BIP-32 seed (no PBKDF2
/// stretching) and amount `i` in `amounts` gets `path/i'`.
///
/// `path` must be a [`DerivationPath`]; the older generations hash it as text.
pub fn derive_keys(mnemonic: &str, path: &str, amounts: &[u64]) -> Result<PrivateKeys> {
    let path: DerivationPath = path.parse()?;
    let base = ExtendedPrivateKey::from_seed(mnemonic.as_bytes())?.derive_path(&path)?;
    amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            let child = base.derive_child(hardened_index(i)?)?;
            Ok((amount, child.private_key()))
        })
        .collect()
}

/// 0.12 to 0.14 derivation: `SHA256(seed || path || i)`.
pub fn derive_keys_pre_0_15(seed: &str, path: &str, amounts: &[u64]) -> Result<PrivateKeys> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            let digest = legacy_digest(seed, path, i);
            Ok((amount, Scalar::from_bytes(&digest)?))
        })
        .collect()
}

/// Pre-0.12 derivation. Uses the first 32 bytes of the hex digest's text
/// rather than the digest itself, and always yields [`LEGACY_AMOUNTS`].
pub fn derive_keys_insecure_pre_0_12(seed: &str, path: &str) -> Result<PrivateKeys> {
    warn!("deriving keys with the insecure pre-0.12 scheme");
    LEGACY_AMOUNTS
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            let hex_digest = hex::encode(legacy_digest(seed, path, i));
            Ok((amount, Scalar::from_bytes(&hex_digest.as_bytes()[..32])?))
        })
        .collect()
}

pub fn derive_keys_for_generation(
    generation: Generation,
    seed: &str,
    path: &str,
    amounts: &[u64],
) -> Result<PrivateKeys> {
    match generation {
        Generation::InsecurePre012 => derive_keys_insecure_pre_0_12(seed, path),
        Generation::Pre015 => derive_keys_pre_0_15(seed, path, amounts),
        Generation::Bip32 => derive_keys(seed, path, amounts),
    }
}

pub fn derive_keys_for_version(
    seed: &str,
    path: &str,
    amounts: &[u64],
    version: &str,
) -> Result<PrivateKeys> {
    derive_keys_for_generation(version.parse()?, seed, path, amounts)
}

fn legacy_digest(seed: &str, path: &str, index: usize) -> [u8; 32] {
    sha256_concat(&[
        seed.as_bytes(),
        path.as_bytes(),
        index.to_string().as_bytes(),
    ])
}

fn hardened_index(i: usize) -> Result<u32> {
    u32::try_from(i)
        .ok()
        .filter(|&i| i < HARDENED_OFFSET)
        .map(|i| i | HARDENED_OFFSET)
        .ok_or_else(|| Error::DerivationPathInvalid(format!("amount index {} out of range", i)))
}

/// Single, non-denominated key: `SHA256(seed)·G`.
pub fn derive_pubkey(seed: &str) -> Result<Point> {
    Ok(Scalar::from_bytes(&sha256(seed.as_bytes()))?.public_key())
}

/// Public points for those of `amounts` present in `keys`.
pub fn derive_pubkeys(keys: &PrivateKeys, amounts: &[u64]) -> PublicKeys {
    amounts
        .iter()
        .filter_map(|amount| keys.get(amount).map(|k| (*amount, k.public_key())))
        .collect()
}

pub fn public_keys(keys: &PrivateKeys) -> PublicKeys {
    keys.iter().map(|(&amount, k)| (amount, k.public_key())).collect()
}

fn sorted_by_amount<'a, I>(keys: I) -> Vec<&'a Point>
where
    I: IntoIterator<Item = (&'a u64, &'a Point)>,
{
    let mut sorted: Vec<_> = keys.into_iter().collect();
    sorted.sort();
    sorted.into_iter().map(|(_, point)| point).collect()
}

/// `"00"` followed by the first 14 hex characters of
/// `SHA256(compressed points sorted by amount)`.
pub fn derive_keyset_id<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = (&'a u64, &'a Point)>,
{
    let concatenated: Vec<u8> = sorted_by_amount(keys)
        .into_iter()
        .flat_map(|p| p.to_compressed())
        .collect();
    let digest = hex::encode(sha256(&concatenated));
    format!(
        "{}{}",
        KEYSET_ID_VERSION_PREFIX,
        &digest[..HEX_KEYSET_ID_DIGEST_CHARS]
    )
}

/// Pre-0.15 id: the first 12 base64 characters of
/// `SHA256(hex of compressed points sorted by amount)`.
pub fn derive_keyset_id_legacy<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = (&'a u64, &'a Point)>,
{
    let concatenated: String = sorted_by_amount(keys)
        .into_iter()
        .map(|p| p.to_hex(true))
        .collect();
    let encoded = STANDARD.encode(sha256(concatenated.as_bytes()));
    encoded[..BASE64_KEYSET_ID_CHARS].to_string()
}

pub fn derive_keyset_id_with_format<'a, I>(keys: I, format: KeysetIdFormat) -> String
where
    I: IntoIterator<Item = (&'a u64, &'a Point)>,
{
    match format {
        KeysetIdFormat::Hex => derive_keyset_id(keys),
        KeysetIdFormat::Base64 => derive_keyset_id_legacy(keys),
    }
}

pub fn derive_keyset_id_for_version<'a, I>(keys: I, version: &str) -> Result<String>
where
    I: IntoIterator<Item = (&'a u64, &'a Point)>,
{
    Ok(derive_keyset_id_with_format(keys, version.parse()?))
}

/// Denominations `1, 2, 4, ..., 2^(max_order - 1)`.
pub fn standard_amounts(max_order: u32) -> Vec<u64> {
    (0..max_order).filter_map(|i| 1u64.checked_shl(i)).collect()
}

/// URL-safe, unpadded base64 of 30 random bytes.
pub fn random_hash<R: CryptoRng + RngCore>(rng: &mut R) -> String {
    let mut bytes = [0u8; RANDOM_HASH_BYTES];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// One epoch of mint keys.
#[derive(Clone, Debug)]
pub struct Keyset {
    id: String,
    generation: Generation,
    derivation_path: String,
    private_keys: PrivateKeys,
    public_keys: PublicKeys,
}

impl Keyset {
    /// Derives the keys `version` would have produced and their id.
    pub fn generate(seed: &str, derivation_path: &str, amounts: &[u64], version: &str) -> Result<Self> {
        let version: Version = version.parse()?;
        let generation = Generation::for_version(version);

        let private_keys = derive_keys_for_generation(generation, seed, derivation_path, amounts)?;
        let public_keys = public_keys(&private_keys);
        let id = derive_keyset_id_with_format(&public_keys, KeysetIdFormat::for_version(version));
        debug!(%id, ?generation, keys = public_keys.len(), "generated keyset");

        Ok(Self {
            id,
            generation,
            derivation_path: derivation_path.to_string(),
            private_keys,
            public_keys,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    pub fn private_key(&self, amount: u64) -> Option<&Scalar> {
        self.private_keys.get(&amount)
    }

    pub fn public_key(&self, amount: u64) -> Option<&Point> {
        self.public_keys.get(&amount)
    }

    pub fn public_keys(&self) -> &PublicKeys {
        &self.public_keys
    }

    pub fn amounts(&self) -> impl Iterator<Item = u64> + '_ {
        self.public_keys.keys().copied()
    }
}
