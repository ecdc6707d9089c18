use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::AppError;

/// Token type discriminator — prevents using a refresh token as an access token.
const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims stored in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    /// The canonical identity: the account email.
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier — prevents hash collisions when multiple
    /// tokens are issued for the same user within the same second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Token type: "access" or "refresh".
    #[serde(default)]
    pub typ: String,
}

impl Claims {
    /// Project the "username" claim out of the verified token. Signature
    /// and expiry checks have already happened by the time claims exist.
    pub fn username_claim(&self) -> Result<&str, AppError> {
        if self.username.is_empty() {
            return Err(AppError::unauthorized("Token carries no username claim"));
        }
        Ok(&self.username)
    }
}

/// Compute the SHA-256 hash of a raw JWT string, returned as a hex-encoded
/// string. The raw refresh token goes to the client while only the hash is
/// persisted in the database.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").expect("JWT_SECRET must be set")
}

pub fn access_token_expiry_minutes() -> i64 {
    std::env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15)
}

pub fn refresh_token_expiry_days() -> i64 {
    std::env::var("JWT_REFRESH_TOKEN_EXPIRY_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7)
}

pub fn create_access_token(
    user_id: i64,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(access_token_expiry_minutes())).timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
        typ: TOKEN_TYPE_ACCESS.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
}

pub fn create_refresh_token(
    user_id: i64,
    username: &str,
) -> Result<(String, chrono::DateTime<Utc>), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + Duration::days(refresh_token_expiry_days());
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
        typ: TOKEN_TYPE_REFRESH.to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )?;
    Ok((token, expires_at))
}

/// Validate an access token. Rejects tokens with `typ: "refresh"` so a
/// refresh token can never be presented as an access token.
pub fn validate_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.typ == TOKEN_TYPE_REFRESH {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}

/// Validate a refresh token. Requires `typ: "refresh"`.
pub fn validate_refresh_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.typ != TOKEN_TYPE_REFRESH {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_secret() {
        std::env::set_var("JWT_SECRET", "test-secret-key-for-jwt-unit-tests");
    }

    #[test]
    fn create_and_validate_access_token() {
        setup_test_secret();
        let token = create_access_token(42, "alex@studyline.dev").unwrap();
        let claims = validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alex@studyline.dev");
        assert_eq!(claims.typ, TOKEN_TYPE_ACCESS);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn username_claim_projection() {
        setup_test_secret();
        let token = create_access_token(7, "maria@studyline.dev").unwrap();
        let claims = validate_access_token(&token).unwrap();
        assert_eq!(claims.username_claim().unwrap(), "maria@studyline.dev");

        let blank = Claims {
            username: String::new(),
            ..claims
        };
        assert!(blank.username_claim().is_err());
    }

    #[test]
    fn expired_token_rejected() {
        setup_test_secret();
        let now = Utc::now();
        let claims = Claims {
            sub: 1,
            username: "expired@studyline.dev".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            jti: None,
            typ: TOKEN_TYPE_ACCESS.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_secret().as_bytes()),
        )
        .unwrap();

        assert!(validate_access_token(&token).is_err());
    }

    #[test]
    fn invalid_token_rejected() {
        setup_test_secret();
        assert!(validate_access_token("not.a.valid.jwt").is_err());
        assert!(validate_access_token("").is_err());
    }

    #[test]
    fn refresh_token_has_later_expiry() {
        setup_test_secret();
        let access = create_access_token(1, "a@b.com").unwrap();
        let (refresh, _) = create_refresh_token(1, "a@b.com").unwrap();

        let access_claims = validate_access_token(&access).unwrap();
        let refresh_claims = validate_refresh_token(&refresh).unwrap();

        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn refresh_token_rejected_by_access_validator() {
        setup_test_secret();
        let (refresh, _) = create_refresh_token(1, "a@b.com").unwrap();
        assert!(validate_access_token(&refresh).is_err());
    }

    #[test]
    fn access_token_rejected_by_refresh_validator() {
        setup_test_secret();
        let access = create_access_token(1, "a@b.com").unwrap();
        assert!(validate_refresh_token(&access).is_err());
    }

    #[test]
    fn hash_token_produces_consistent_hex() {
        let token = "eyJhbGciOiJIUzI1NiJ9.test-payload.signature";
        let hash1 = hash_token(token);
        let hash2 = hash_token(token);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_produce_different_hashes() {
        assert_ne!(hash_token("token-aaa"), hash_token("token-bbb"));
    }
}
