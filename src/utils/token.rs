use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

// Tokens are issued by the identity service; this side only verifies them
// and extracts the subject.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    );

    match decoded {
        Ok(token) => Ok(token.claims.sub),
        Err(_) => Err(HttpError::unauthorized(
            ErrorMessage::InvalidToken.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(sub: &str, secret: &[u8], expires_in_seconds: i64) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: sub.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(expires_in_seconds)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn token_round_trips_the_subject() {
        let secret = b"test-secret";
        let user_id = uuid::Uuid::new_v4().to_string();
        let token = make_token(&user_id, secret, 60);
        let sub = decode_token(token, secret).unwrap();
        assert_eq!(sub, user_id);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = make_token("abc", b"secret-a", 60);
        assert!(decode_token(token, b"secret-b").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = b"test-secret";
        let token = make_token("abc", secret, -120);
        assert!(decode_token(token, secret).is_err());
    }
}
