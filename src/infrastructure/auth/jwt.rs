//! JWT token generation and validation

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Lifetime of every issued token
pub const TOKEN_EXPIRATION_HOURS: u64 = 24;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User the token is bound to
    pub user_id: i64,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create claims for a user, issued at `issued_at`
    pub fn for_user(user_id: UserId, issued_at: DateTime<Utc>, expiration_hours: u64) -> Self {
        let exp = issued_at + Duration::hours(expiration_hours as i64);

        Self {
            user_id: user_id.value(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get user ID from claims
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_id)
    }

    /// Expiration instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: u64,
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[redacted]")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl JwtConfig {
    /// Create JWT configuration with the standard 24 hour lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: TOKEN_EXPIRATION_HOURS,
        }
    }
}

/// A signed token together with its claims
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
}

/// Trait for JWT operations
pub trait JwtGenerator: Send + Sync + Debug {
    /// Generate a signed token for a user
    fn generate(&self, user_id: UserId) -> Result<IssuedToken, DomainError>;

    /// Validate a token's signature and expiry and return the claims
    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError>;
}

/// HS256 JWT service keyed by a shared secret
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }
}

impl JwtGenerator for JwtService {
    fn generate(&self, user_id: UserId) -> Result<IssuedToken, DomainError> {
        let claims = JwtClaims::for_user(user_id, Utc::now(), self.config.expiration_hours);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::authentication(format!("Invalid token: {}", e)))?;

        // A token is dead from its `exp` second onwards
        if token_data.claims.is_expired() {
            return Err(DomainError::authentication("Invalid token: token has expired"));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret-key-12345"))
    }

    #[test]
    fn test_generate_and_validate() {
        let service = create_service();

        let issued = service.generate(UserId::new(42)).unwrap();
        assert!(!issued.token.is_empty());

        let claims = service.validate(&issued.token).unwrap();
        assert_eq!(claims.user_id(), UserId::new(42));
        assert_eq!(claims, issued.claims);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expiration_is_24_hours_after_issuance() {
        let service = create_service();

        let issued = service.generate(UserId::new(1)).unwrap();
        let claims = service.validate(&issued.token).unwrap();

        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!((claims.iat - Utc::now().timestamp()).abs() <= 5);
    }

    #[test]
    fn test_claims_for_user() {
        let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = JwtClaims::for_user(UserId::new(7), issued_at, 24);

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(
            claims.expires_at(),
            Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
        );
        assert!(claims.is_expired());
    }

    #[test]
    fn test_invalid_token() {
        let service = create_service();

        let err = service.validate("invalid-token").unwrap_err();
        assert!(matches!(err, DomainError::Authentication { .. }));
    }

    #[test]
    fn test_tampered_token() {
        let service = create_service();
        let issued = service.generate(UserId::new(1)).unwrap();

        let forged = JwtClaims {
            user_id: 2,
            ..issued.claims.clone()
        };
        let forged_payload = encode(
            &Header::new(Algorithm::HS256),
            &forged,
            &EncodingKey::from_secret(b"attacker-secret"),
        )
        .unwrap();

        // Signature of the genuine token over the forged header+payload
        let genuine_signature = issued.token.rsplit('.').next().unwrap();
        let forged_body = forged_payload.rsplitn(2, '.').nth(1).unwrap();
        let tampered = format!("{}.{}", forged_body, genuine_signature);

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret-1"));
        let service2 = JwtService::new(JwtConfig::new("secret-2"));

        let issued = service1.generate(UserId::new(1)).unwrap();

        // Token signed with a different secret should fail validation
        assert!(service2.validate(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = create_service();

        let past = Utc::now() - Duration::hours(25);
        let claims = JwtClaims::for_user(UserId::new(1), past, 24);

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-12345"),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }

    fn sign(claims: &JwtClaims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"test-secret-key-12345"),
        )
        .unwrap()
    }

    #[test]
    fn test_recently_expired_token_is_rejected() {
        let service = create_service();
        let now = Utc::now().timestamp();

        for seconds_ago in [30, 1, 0] {
            let claims = JwtClaims {
                user_id: 1,
                iat: now - 3600,
                exp: now - seconds_ago,
            };

            let err = service.validate(&sign(&claims)).unwrap_err();
            assert!(
                matches!(err, DomainError::Authentication { .. }),
                "token expired {}s ago was accepted",
                seconds_ago
            );
        }
    }

    #[test]
    fn test_token_valid_until_exp() {
        let service = create_service();
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            user_id: 9,
            iat: now,
            exp: now + 60,
        };

        let validated = service.validate(&sign(&claims)).unwrap();
        assert_eq!(validated.user_id(), UserId::new(9));
    }

    #[test]
    fn test_debug_hides_secret() {
        let service = create_service();
        let debug = format!("{:?}", service);

        assert!(!debug.contains("test-secret-key-12345"));
        assert!(debug.contains("[redacted]"));
    }
}
