use bdhke::keys::{self, Keyset};
use bdhke::{
    blind_message, dleq, hash_to_curve, mnemonic, sign_blinded_message, verify, verify_with_policy,
    DleqProof, Generation, Result, Scalar, VerificationPolicy,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const PATH: &str = "m/0'/0'/0'";

#[test]
fn issue_and_redeem_against_derived_keyset() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);
    let phrase = mnemonic::generate_mnemonic(12, &mut rng)?;
    let keyset = Keyset::generate(&phrase, PATH, &keys::standard_amounts(8), "0.15.0")?;
    assert_eq!(keyset.generation(), Generation::Bip32);
    assert!(keyset.id().starts_with("00"));

    let amount = 64;
    let mint_key = *keyset.private_key(amount).expect("amount in keyset");
    let mint_pubkey = *keyset.public_key(amount).expect("amount in keyset");

    // wallet
    let secret = keys::random_hash(&mut rng);
    let blinded = blind_message(secret.as_bytes(), None, &mut rng)?;

    // mint
    let promise = sign_blinded_message(&blinded.blinded_msg(), &mint_key, None, &mut rng)?;

    // wallet
    assert!(promise.verify_dleq(&blinded.blinded_msg(), &mint_pubkey));
    let c = promise.signature_for_secret(&blinded.blinding_factor(), &mint_pubkey)?;
    let proof = promise.dleq_for_secret(blinded.blinding_factor());

    // a third party receiving the token with its proof
    let json = serde_json::to_string(&proof).unwrap();
    let received: DleqProof = serde_json::from_str(&json).unwrap();
    assert!(received.verify_unblinded(secret.as_bytes(), &c, &mint_pubkey)?);

    // mint on redemption
    assert_eq!(c, hash_to_curve(secret.as_bytes())?.mul(&mint_key));
    assert!(verify(&mint_key, &c, secret.as_bytes())?);
    assert!(verify_with_policy(&mint_key, &c, secret.as_bytes(), &VerificationPolicy::STRICT)?);

    let other_key = *keyset.private_key(1).expect("amount in keyset");
    assert!(!verify(&other_key, &c, secret.as_bytes())?);
    Ok(())
}

#[test]
fn tampered_promise_is_detected() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let keyset = Keyset::generate("seed", "m/0'", &[1, 2, 4], "0.14.0")?;
    let mint_key = *keyset.private_key(4).expect("amount in keyset");
    let mint_pubkey = *keyset.public_key(4).expect("amount in keyset");

    let blinded = blind_message(b"secret", None, &mut rng)?;
    let mut promise = sign_blinded_message(&blinded.blinded_msg(), &mint_key, None, &mut rng)?;
    promise.blinded_sig = promise.blinded_sig.tweak_add(&Scalar::from_u64(1)?)?;

    assert!(!dleq::verify_blinded(
        &blinded.blinded_msg(),
        &promise.blinded_sig,
        &promise.dleq,
        &mint_pubkey
    ));

    let c = promise.signature_for_secret(&blinded.blinding_factor(), &mint_pubkey)?;
    assert!(!verify(&mint_key, &c, b"secret")?);
    Ok(())
}

#[test]
fn keyset_id_depends_only_on_public_keys() -> Result<()> {
    let amounts = keys::standard_amounts(4);
    let keyset = Keyset::generate("seed", PATH, &amounts, "0.15.0")?;

    let mut reversed: Vec<_> = keyset.public_keys().iter().collect();
    reversed.reverse();
    assert_eq!(keys::derive_keyset_id(reversed), keyset.id());
    assert_eq!(
        keys::derive_keyset_id_for_version(keyset.public_keys(), "0.15.2")?,
        keyset.id()
    );
    Ok(())
}
