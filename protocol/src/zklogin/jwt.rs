//! JWT claim decoding.
//!
//! We only read claims, never verify the token: the prover checks the
//! provider's signature as part of the proof, and the chain checks the
//! proof.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer};

use super::{ZkLoginError, ZkLoginResult};

/// The claims zkLogin cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    #[serde(deserialize_with = "single_audience")]
    pub aud: String,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// `aud` is either a string or an array of strings; zkLogin uses the first.
fn single_audience<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Aud {
        One(String),
        Many(Vec<String>),
    }
    match Aud::deserialize(deserializer)? {
        Aud::One(s) => Ok(s),
        Aud::Many(v) => v
            .into_iter()
            .next()
            .ok_or_else(|| serde::de::Error::custom("empty aud array")),
    }
}

/// Decodes the payload segment of a compact JWT.
pub fn decode_claims(jwt: &str) -> ZkLoginResult<JwtClaims> {
    let mut segments = jwt.trim().split('.');
    let (Some(_header), Some(payload), Some(_sig), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ZkLoginError::MalformedJwt(
            "expected three dot-separated segments".into(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ZkLoginError::MalformedJwt(format!("payload is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ZkLoginError::MalformedJwt(format!("payload claims: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds an unsigned compact JWT around `claims`.
    pub(crate) fn make_jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        format!("{header}.{payload}.c2ln")
    }

    #[test]
    fn decodes_standard_claims() {
        let jwt = make_jwt(serde_json::json!({
            "iss": "https://accounts.google.com",
            "sub": "1234567890",
            "aud": "client-id.apps.googleusercontent.com",
            "nonce": "abc",
            "exp": 1700000000
        }));
        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims.sub, "1234567890");
        assert_eq!(claims.aud, "client-id.apps.googleusercontent.com");
        assert_eq!(claims.nonce.as_deref(), Some("abc"));
    }

    #[test]
    fn audience_array_uses_first_entry() {
        let jwt = make_jwt(serde_json::json!({
            "iss": "https://id.twitch.tv/oauth2",
            "sub": "42",
            "aud": ["first", "second"]
        }));
        assert_eq!(decode_claims(&jwt).unwrap().aud, "first");
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(decode_claims("only.two").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
        let missing_sub = make_jwt(serde_json::json!({"iss": "x", "aud": "y"}));
        assert!(decode_claims(&missing_sub).is_err());
    }
}
