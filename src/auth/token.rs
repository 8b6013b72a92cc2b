//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying `sub` (user id), `username`, `iat` and
//! `exp`. They are stateless: nothing is stored server-side and there is no
//! revocation, so a token stays valid until `exp` even after logout.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::Identity;

/// Lifetime of an issued token.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature does not match")]
    BadSignature,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in verify_at against an explicit clock.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, VerificationError> {
        self.verify_at(token, Utc::now())
    }

    /// Valid up to and including the `exp` second; `Expired` from the next one.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, VerificationError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::BadSignature,
                _ => VerificationError::Malformed,
            })?;
        let claims = data.claims;

        if now.timestamp() > claims.exp {
            return Err(VerificationError::Expired);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| VerificationError::Malformed)?;
        Ok(Identity {
            user_id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::parse_str("6f1c3c1e-8a8e-4c55-9d0c-3f1b2a6f9e01").unwrap(),
            username: "ana".into(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let svc = TokenService::new("secret");
        let token = svc.issue(&identity()).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), identity());
    }

    #[test]
    fn test_expiry_is_exactly_one_hour() {
        let svc = TokenService::new("secret");
        let token = svc.issue_at(&identity(), t0()).unwrap();
        let exp = t0() + Duration::seconds(TOKEN_TTL_SECS);

        assert!(svc.verify_at(&token, t0()).is_ok());
        assert!(svc.verify_at(&token, exp - Duration::seconds(1)).is_ok());
        assert!(svc.verify_at(&token, exp).is_ok());
        assert_eq!(
            svc.verify_at(&token, exp + Duration::seconds(1)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let token = TokenService::new("secret-1").issue(&identity()).unwrap();
        assert_eq!(
            TokenService::new("secret-2").verify(&token),
            Err(VerificationError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_bad_signature() {
        let svc = TokenService::new("secret");
        let token = svc.issue_at(&identity(), t0()).unwrap();
        let forged = svc
            .issue_at(
                &Identity {
                    user_id: Uuid::new_v4(),
                    username: "mallory".into(),
                },
                t0(),
            )
            .unwrap();

        // header.payload-from-forged.signature-from-original
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert_eq!(svc.verify_at(&spliced, t0()), Err(VerificationError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let svc = TokenService::new("secret");
        assert_eq!(svc.verify(""), Err(VerificationError::Malformed));
        assert_eq!(svc.verify("not-a-jwt"), Err(VerificationError::Malformed));
        assert_eq!(svc.verify("a.b.c"), Err(VerificationError::Malformed));
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let svc = TokenService::new("secret");
        let claims = Claims {
            sub: "42".into(),
            username: "ana".into(),
            iat: t0().timestamp(),
            exp: t0().timestamp() + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(svc.verify_at(&token, t0()), Err(VerificationError::Malformed));
    }

    #[test]
    fn test_claims_carry_timestamps() {
        let svc = TokenService::new("secret");
        let token = svc.issue_at(&identity(), t0()).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.iat, t0().timestamp());
        assert_eq!(data.claims.exp - data.claims.iat, TOKEN_TTL_SECS);
        assert_eq!(data.claims.username, "ana");
    }
}
