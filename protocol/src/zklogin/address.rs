//! Address derivation.
//!
//! ```text
//! seed    = Poseidon(H("sub", 32), H(sub, 115), H(aud, 120), Poseidon(salt))
//! address = Blake2b-256(0x05 ‖ len(iss) ‖ iss ‖ seed as 32-byte big-endian)
//! ```
//!
//! `H` is [`hash_ascii_str_to_field`]. The salt is what keeps the OAuth
//! identity unlinkable from the address; losing it means losing the account.

use ark_bn254::Fr;

use super::jwt::decode_claims;
use super::{ZkLoginError, ZkLoginResult};
use crate::config::{
    KEY_CLAIM_NAME, MAX_AUD_VALUE_LENGTH, MAX_KEY_CLAIM_NAME_LENGTH, MAX_KEY_CLAIM_VALUE_LENGTH,
};
use crate::crypto::hash::blake2b256_parts;
use crate::crypto::keys::SignatureScheme;
use crate::crypto::poseidon::{
    fr_from_decimal, fr_to_be_bytes, fr_to_decimal, hash_ascii_str_to_field, poseidon_hash,
};
use crate::types::SuiAddress;

/// Google issues tokens with a bare host as `iss`; the chain normalizes it.
fn normalize_issuer(iss: &str) -> &str {
    if iss == "accounts.google.com" {
        "https://accounts.google.com"
    } else {
        iss
    }
}

/// Derives the address seed as a decimal string.
pub fn gen_address_seed(
    salt: &str,
    claim_name: &str,
    claim_value: &str,
    aud: &str,
) -> ZkLoginResult<String> {
    let salt_hash = poseidon_hash(&[fr_from_decimal(salt)?])?;
    let seed = poseidon_hash(&[
        hash_ascii_str_to_field(claim_name, MAX_KEY_CLAIM_NAME_LENGTH)?,
        hash_ascii_str_to_field(claim_value, MAX_KEY_CLAIM_VALUE_LENGTH)?,
        hash_ascii_str_to_field(aud, MAX_AUD_VALUE_LENGTH)?,
        salt_hash,
    ])?;
    Ok(fr_to_decimal(&seed))
}

/// Computes the address for an address seed and issuer.
pub fn address_from_seed(address_seed: &str, iss: &str) -> ZkLoginResult<SuiAddress> {
    let seed: Fr = fr_from_decimal(address_seed)?;
    let iss = normalize_issuer(iss).as_bytes();
    let iss_len = u8::try_from(iss.len())
        .map_err(|_| ZkLoginError::IssuerTooLong(String::from_utf8_lossy(iss).into_owned()))?;

    let prefix = [SignatureScheme::ZkLogin.flag(), iss_len];
    let seed_bytes = fr_to_be_bytes(&seed);
    let hash = blake2b256_parts(&[&prefix[..], iss, &seed_bytes[..]]);
    Ok(SuiAddress::new(hash))
}

/// Derives the address of the JWT's subject under `salt`.
pub fn jwt_to_address(jwt: &str, salt: &str) -> ZkLoginResult<SuiAddress> {
    let claims = decode_claims(jwt)?;
    let seed = gen_address_seed(salt, KEY_CLAIM_NAME, &claims.sub, &claims.aud)?;
    address_from_seed(&seed, &claims.iss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zklogin::jwt::tests::make_jwt;

    fn google_jwt(sub: &str, aud: &str) -> String {
        make_jwt(serde_json::json!({
            "iss": "https://accounts.google.com",
            "sub": sub,
            "aud": aud,
        }))
    }

    #[test]
    fn address_is_deterministic() {
        let jwt = google_jwt("110463452167303598383", "client.apps");
        let a = jwt_to_address(&jwt, "129390038577185583942388216820280642146").unwrap();
        let b = jwt_to_address(&jwt, "129390038577185583942388216820280642146").unwrap();
        assert_eq!(a, b);
        assert!(a.to_string().starts_with("0x"));
    }

    #[test]
    fn address_depends_on_salt_sub_and_aud() {
        let salt = "1000";
        let base = jwt_to_address(&google_jwt("alice", "app"), salt).unwrap();
        assert_ne!(base, jwt_to_address(&google_jwt("alice", "app"), "1001").unwrap());
        assert_ne!(base, jwt_to_address(&google_jwt("bob", "app"), salt).unwrap());
        assert_ne!(base, jwt_to_address(&google_jwt("alice", "other"), salt).unwrap());
    }

    #[test]
    fn google_issuer_is_normalized() {
        let seed = gen_address_seed("7", "sub", "alice", "app").unwrap();
        assert_eq!(
            address_from_seed(&seed, "accounts.google.com").unwrap(),
            address_from_seed(&seed, "https://accounts.google.com").unwrap()
        );
        assert_ne!(
            address_from_seed(&seed, "https://id.twitch.tv/oauth2").unwrap(),
            address_from_seed(&seed, "https://accounts.google.com").unwrap()
        );
    }

    #[test]
    fn oversized_claims_are_rejected() {
        let long_sub = "s".repeat(MAX_KEY_CLAIM_VALUE_LENGTH + 1);
        assert!(gen_address_seed("1", "sub", &long_sub, "app").is_err());
    }

    #[test]
    fn bad_salt_is_rejected() {
        assert!(jwt_to_address(&google_jwt("alice", "app"), "salty").is_err());
    }
}
