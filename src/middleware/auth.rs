use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// What the caller's role allows beyond ordinary quote editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// May approve or reject quotes waiting for approval
    pub can_approve: bool,
    /// May send a draft to the client without approval
    pub can_bypass_approval: bool,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: String,
    pub capabilities: Capabilities,
}

/// Resolves an opaque bearer token to a caller
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> crate::core::Result<Principal>;
}

/// Shared handle stored in app data
pub type SharedIdentityResolver = Arc<dyn IdentityResolver>;

/// Bearer-token authentication middleware
///
/// Resolves `Authorization: Bearer <token>` and stores the `Principal` in
/// request extensions. Health probes are public.
pub struct BearerAuth {
    resolver: SharedIdentityResolver,
}

impl BearerAuth {
    pub fn new(resolver: SharedIdentityResolver) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    resolver: SharedIdentityResolver,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let resolver = self.resolver.clone();

        Box::pin(async move {
            let path = req.path();
            if path == "/health" || path == "/ready" {
                return svc.call(req).await;
            }

            let token = bearer_token(req.headers().get("Authorization").and_then(|h| h.to_str().ok()))
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing bearer token")))?;

            let principal = resolver.resolve(&token).await.map_err(Error::from)?;

            tracing::debug!(
                user_id = %principal.user_id,
                role = %principal.role,
                "Caller authenticated"
            );

            req.extensions_mut().insert(principal);

            svc.call(req).await
        })
    }
}

/// Extract the token from an `Authorization` header value
fn bearer_token(header: Option<&str>) -> Option<String> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or_else(|| Error::from(AppError::unauthorized("Request is not authenticated"))),
        )
    }
}

/// Hex SHA-256 digest under which session tokens are stored
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PrincipalRow {
    user_id: String,
    role_name: String,
    can_approve_quotes: bool,
    can_bypass_approval: bool,
}

/// Looks sessions up in MySQL by token digest
pub struct MySqlIdentityResolver {
    pool: MySqlPool,
}

impl MySqlIdentityResolver {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for MySqlIdentityResolver {
    async fn resolve(&self, token: &str) -> crate::core::Result<Principal> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT u.id AS user_id, r.name AS role_name,
                   r.can_approve_quotes, r.can_bypass_approval
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            JOIN roles r ON r.id = u.role_id
            WHERE s.token_hash = ? AND s.expires_at > NOW() AND u.is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

        Ok(Principal {
            user_id: row.user_id,
            role: row.role_name,
            capabilities: Capabilities {
                can_approve: row.can_approve_quotes,
                can_bypass_approval: row.can_bypass_approval,
            },
        })
    }
}
