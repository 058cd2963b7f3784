use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    ApiKey,
    Jwt,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
}

/// Caller identity: `api_key` for key auth, the token subject for JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        match config.mode {
            AuthMode::ApiKey => authorize_api_key(parts, &config),
            AuthMode::Jwt => authorize_jwt(parts, &config),
        }
    }
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing SL_API_KEY".into()))?;

    let provided = parts
        .headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    Ok(AuthUser {
        subject: "api_key".to_string(),
    })
}

fn authorize_jwt(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing JWT_SECRET".into()))?;

    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    Ok(AuthUser {
        subject: data.claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: usize,
    }

    fn parts(header: Option<(&str, &str)>) -> Parts {
        let mut builder = Request::builder().uri("/api/jobs");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn jwt_config() -> AuthConfig {
        AuthConfig {
            mode: AuthMode::Jwt,
            api_key: None,
            jwt_secret: Some("topsecret".into()),
        }
    }

    #[test]
    fn api_key_must_match() {
        let config = AuthConfig {
            mode: AuthMode::ApiKey,
            api_key: Some("k1".into()),
            jwt_secret: None,
        };

        assert!(authorize_api_key(&parts(Some(("x-api-key", "k1"))), &config).is_ok());
        assert!(matches!(
            authorize_api_key(&parts(Some(("x-api-key", "k2"))), &config),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(authorize_api_key(&parts(None), &config).is_err());
    }

    #[test]
    fn jwt_subject_becomes_the_caller() {
        let token = encode(
            &Header::default(),
            &TestClaims {
                sub: "employer-42",
                exp: 4_102_444_800,
            },
            &EncodingKey::from_secret(b"topsecret"),
        )
        .unwrap();
        let bearer = format!("Bearer {token}");

        let user = authorize_jwt(&parts(Some(("authorization", &bearer))), &jwt_config()).unwrap();
        assert_eq!(user.subject, "employer-42");
    }

    #[test]
    fn jwt_signed_with_another_secret_is_rejected() {
        let token = encode(
            &Header::default(),
            &TestClaims {
                sub: "intruder",
                exp: 4_102_444_800,
            },
            &EncodingKey::from_secret(b"not-the-secret"),
        )
        .unwrap();
        let bearer = format!("Bearer {token}");

        assert!(authorize_jwt(&parts(Some(("authorization", &bearer))), &jwt_config()).is_err());
        let basic = parts(Some(("authorization", "Basic abc")));
        assert!(authorize_jwt(&basic, &jwt_config()).is_err());
    }
}
