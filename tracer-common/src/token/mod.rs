pub mod auth_token;

use base64::engine::general_purpose::URL_SAFE as b64_urlsafe;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug)]
pub enum TokenError {
    TokenInvalid,
    TokenExpired,
    TokenMissing,
    WrongTokenType,
}

impl std::error::Error for TokenError {}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::TokenInvalid => write!(f, "TokenInvalid"),
            TokenError::TokenExpired => write!(f, "TokenExpired"),
            TokenError::TokenMissing => write!(f, "TokenMissing"),
            TokenError::WrongTokenType => write!(f, "WrongTokenType"),
        }
    }
}

pub trait Expiring {
    fn expiration(&self) -> u64;
}

pub trait TokenSignatureVerifier {
    fn signature_length() -> usize;
    fn verify(json: &[u8], signature: &[u8], key: &[u8]) -> bool;
}

#[derive(Debug)]
pub struct DecodedToken<C, V>
where
    C: Expiring + DeserializeOwned,
    V: TokenSignatureVerifier,
{
    pub json: Vec<u8>,
    pub signature: Vec<u8>,
    pub claims: C,
    phantom: PhantomData<V>,
}

impl<C, V> DecodedToken<C, V>
where
    C: Expiring + DeserializeOwned,
    V: TokenSignatureVerifier,
{
    pub fn verify(&self, key: &[u8]) -> Result<&C, TokenError> {
        if !V::verify(&self.json, &self.signature, key) {
            return Err(TokenError::TokenInvalid);
        }

        let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) else {
            return Err(TokenError::TokenInvalid);
        };

        if self.claims.expiration() <= now.as_secs() {
            return Err(TokenError::TokenExpired);
        }

        Ok(&self.claims)
    }
}

pub trait Token {
    type Claims: Expiring + DeserializeOwned;
    type Verifier: TokenSignatureVerifier;

    fn token_name() -> &'static str;

    fn decode(token: &str) -> Result<DecodedToken<Self::Claims, Self::Verifier>, TokenError> {
        const MAX_TOKEN_LENGTH: usize = 8192;

        if token.len() > MAX_TOKEN_LENGTH {
            return Err(TokenError::TokenInvalid);
        }

        let decoded_token = b64_urlsafe
            .decode(token)
            .map_err(|_| TokenError::TokenInvalid)?;

        if decoded_token.len() <= Self::Verifier::signature_length() {
            return Err(TokenError::TokenInvalid);
        }

        let json_len = decoded_token.len() - Self::Verifier::signature_length();
        let json = &decoded_token[..json_len];

        let signature = Vec::from(&decoded_token[json_len..]);
        let claims: Self::Claims =
            serde_json::from_slice(json).map_err(|_| TokenError::TokenInvalid)?;

        Ok(DecodedToken {
            json: Vec::from(json),
            signature,
            claims,
            phantom: PhantomData,
        })
    }
}

#[derive(Debug)]
pub struct HmacSha256Verifier {}

impl TokenSignatureVerifier for HmacSha256Verifier {
    fn signature_length() -> usize {
        32
    }

    fn verify(json: &[u8], signature: &[u8], key: &[u8]) -> bool {
        let mut mac =
            HmacSha256::new_from_slice(key).expect("HMAC should not fail to initialize with key");
        mac.update(json);
        let correct_signature = mac.finalize().into_bytes();

        let mut signatures_dont_match = 0u8;

        if correct_signature.len() != signature.len() || signature.is_empty() {
            return false;
        }

        // Do bitwise comparison to prevent timing attacks
        for (i, correct_sig_byte) in correct_signature.iter().enumerate() {
            unsafe {
                signatures_dont_match |= correct_sig_byte ^ signature.get_unchecked(i);
            }
        }

        signatures_dont_match == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Clone, Copy, Serialize, Deserialize)]
    struct TestClaims {
        id: Uuid,
        exp: u64,
    }

    impl Expiring for TestClaims {
        fn expiration(&self) -> u64 {
            self.exp
        }
    }

    struct TestToken {}

    impl Token for TestToken {
        type Claims = TestClaims;
        type Verifier = HmacSha256Verifier;

        fn token_name() -> &'static str {
            "TestToken"
        }
    }

    fn sign_test_token(claims: TestClaims, key: &[u8]) -> String {
        let mut token_unencoded = serde_json::to_vec(&claims).unwrap();

        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(&token_unencoded);
        token_unencoded.extend_from_slice(&mac.finalize().into_bytes());

        b64_urlsafe.encode(&token_unencoded)
    }

    #[test]
    fn test_decode_and_verify() {
        let key = [4u8; 64];
        let id = Uuid::now_v7();
        let exp = (SystemTime::now() + Duration::from_secs(100))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let token = sign_test_token(TestClaims { id, exp }, &key);

        let decoded = TestToken::decode(&token).unwrap();
        let claims = decoded.verify(&key).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let key = [4u8; 64];
        let exp = (SystemTime::now() + Duration::from_secs(100))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let token = sign_test_token(
            TestClaims {
                id: Uuid::now_v7(),
                exp,
            },
            &key,
        );

        let decoded = TestToken::decode(&token).unwrap();
        assert!(matches!(
            decoded.verify(&[5u8; 64]),
            Err(TokenError::TokenInvalid)
        ));
    }

    #[test]
    fn test_verify_rejects_expired_claims() {
        let key = [4u8; 64];
        let exp = (SystemTime::now() - Duration::from_secs(100))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let token = sign_test_token(
            TestClaims {
                id: Uuid::now_v7(),
                exp,
            },
            &key,
        );

        let decoded = TestToken::decode(&token).unwrap();
        assert!(matches!(
            decoded.verify(&key),
            Err(TokenError::TokenExpired)
        ));
    }

    #[test]
    fn test_decode_rejects_tampered_json() {
        let key = [4u8; 64];
        let exp = (SystemTime::now() + Duration::from_secs(100))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let token = sign_test_token(
            TestClaims {
                id: Uuid::now_v7(),
                exp,
            },
            &key,
        );

        let mut raw = b64_urlsafe.decode(&token).unwrap();
        raw[2] ^= 0x01;
        let tampered = b64_urlsafe.encode(&raw);

        let Ok(decoded) = TestToken::decode(&tampered) else {
            return;
        };
        assert!(decoded.verify(&key).is_err());
    }
}
