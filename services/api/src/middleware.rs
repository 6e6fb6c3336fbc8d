//! Authentication middleware for JWT token validation

use access::Identity;
use axum::{
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use common::config::AccessConfig;
use common::error::BackendError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::ApiError, state::AppState};

/// JWT claims issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id
    pub sub: String,
    pub email: String,
    /// Auth provider role; `admin` overrides every permission check
    pub role: String,
    /// Expiration time
    pub exp: u64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity::new(claims.sub, claims.email, claims.role)
    }
}

/// Verifies bearer tokens
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Verifier for HS256 tokens signed with a shared secret
    pub fn hs256(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verifier for RS256 tokens, from a PEM encoded public key
    pub fn rs256(public_key_pem: &str) -> Result<Self, BackendError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| BackendError::Configuration(format!("Invalid JWT public key: {}", e)))?;

        Ok(Self {
            key,
            validation: Validation::new(Algorithm::RS256),
        })
    }

    /// Build the verifier from configuration
    ///
    /// The RS256 public key wins over the HS256 secret. The key may be given
    /// inline or as a path to a PEM file.
    pub fn from_config(config: &AccessConfig) -> Result<Self, BackendError> {
        if let Some(public_key) = &config.jwt_public_key {
            let pem = if public_key.starts_with("-----BEGIN") {
                public_key.clone()
            } else {
                std::fs::read_to_string(public_key)
                    .map_err(|e| {
                        BackendError::Configuration(format!(
                            "Failed to read public key file {}: {}",
                            public_key, e
                        ))
                    })?
                    .trim()
                    .to_string()
            };
            return Self::rs256(&pem);
        }

        match &config.jwt_secret {
            Some(secret) => Ok(Self::hs256(secret)),
            None => Err(BackendError::Configuration(
                "Neither jwt_public_key nor jwt_secret is set".to_string(),
            )),
        }
    }

    /// Decode and validate `token`
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Rejected access token: {}", e);
                ApiError::Unauthorized
            })
    }
}

/// Authentication middleware
///
/// Inserts the caller's [`Identity`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let identity = Identity::from(state.verifier.verify(token)?);
    debug!("Authenticated {} ({})", identity.email, identity.role);

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
