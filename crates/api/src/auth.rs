//! Bearer token verification
//!
//! Tokens are issued elsewhere; this only checks the HS256 signature and
//! expiry and extracts the principal.

use alerting::SubjectId;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;

/// Claims carried by app and bridge tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// Verifies `Authorization: Bearer <jwt>` headers
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and validate a raw token
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("JWT rejected: {}", e);
                ApiError::InvalidToken
            })
    }

    /// Resolve the principal behind a request
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SubjectId, ApiError> {
        let header = headers.get(AUTHORIZATION).ok_or(ApiError::MissingToken)?;
        let header = header.to_str().map_err(|_| ApiError::InvalidToken)?;

        let token = match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(ApiError::InvalidToken),
        };

        self.verify(token).map(|claims| SubjectId::from(claims.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            user_id: 42,
            email: Some("carer@x.com".to_string()),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token() {
        let verifier = JwtVerifier::new(SECRET);
        let subject = verifier
            .authenticate(&headers(&format!("Bearer {}", token(SECRET, far_future()))))
            .unwrap();
        assert_eq!(subject, SubjectId::from(42_i64));
    }

    #[test]
    fn test_missing_header() {
        let verifier = JwtVerifier::new(SECRET);
        assert!(matches!(
            verifier.authenticate(&HeaderMap::new()),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn test_wrong_secret_and_expired() {
        let verifier = JwtVerifier::new(SECRET);
        let forged = headers(&format!("Bearer {}", token("other", far_future())));
        assert!(matches!(verifier.authenticate(&forged), Err(ApiError::InvalidToken)));

        let expired = headers(&format!("Bearer {}", token(SECRET, 1_000)));
        assert!(matches!(verifier.authenticate(&expired), Err(ApiError::InvalidToken)));
    }

    #[test]
    fn test_token_without_scheme() {
        let verifier = JwtVerifier::new(SECRET);
        let bare = headers(&token(SECRET, far_future()));
        assert!(matches!(verifier.authenticate(&bare), Err(ApiError::InvalidToken)));
    }
}
