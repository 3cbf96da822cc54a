//! Access token issuing and verification

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use medisecure_core::AuthError;

/// Signed token payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Username the token was issued to
    sub: String,
    /// Issued-at, seconds since epoch
    iat: u64,
    /// Expiry, seconds since epoch
    exp: u64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// The signing key is process-wide state loaded once at startup; rotating it
/// invalidates every outstanding token. There is no refresh mechanism and no
/// revocation list -- expired tokens require a fresh login.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime_secs: u64,
}

impl TokenIssuer {
    /// Create an issuer from the signing key and token lifetime.
    pub fn new(signing_key: &str, lifetime_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // A token expiring at T must be rejected strictly after T.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
            lifetime_secs,
        }
    }

    /// Issue a token binding `username` to an expiry `lifetime` from now.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = unix_now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.lifetime_secs,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Token encoding failed");
            AuthError::InvalidToken
        })
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AuthError::Expired),
                _ => Err(AuthError::InvalidToken),
            },
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-signing-key", 1800)
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let token = issuer.issue("abhimanyu").unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), "abhimanyu");
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let now = unix_now();
        let claims = Claims {
            sub: "abhimanyu".to_string(),
            iat: now - 3600,
            exp: now - 1,
        };
        let token = encode(&Header::default(), &claims, &issuer.encoding).unwrap();

        assert_eq!(issuer.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_not_yet_expired_token() {
        let issuer = issuer();
        let now = unix_now();
        let claims = Claims {
            sub: "abhimanyu".to_string(),
            iat: now - 1700,
            exp: now + 100,
        };
        let token = encode(&Header::default(), &claims, &issuer.encoding).unwrap();

        assert_eq!(issuer.verify(&token).unwrap(), "abhimanyu");
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer();
        assert_eq!(issuer.verify("not-a-token"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new("different-signing-key", 1800);
        let token = other.issue("abhimanyu").unwrap();

        assert_eq!(issuer.verify(&token), Err(AuthError::InvalidToken));
    }
}
