use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Deserializer};

use crate::core::error::AppError;
use crate::middleware::auth::Principal;
use crate::middleware::request_id::CorrelationId;
use crate::modules::quotes::models::{QuoteDraft, QuoteFilter};
use crate::modules::quotes::services::QuoteService;

/// Body of PUT /quotes/{id}
#[derive(Debug, Deserialize)]
pub struct UpdateQuoteRequest {
    #[serde(flatten)]
    pub draft: QuoteDraft,

    /// Optimistic lock; omitted means "whatever is stored now"
    #[serde(default, deserialize_with = "optional_version")]
    pub expected_version: Option<i64>,
}

// Flattened fields arrive buffered, and with arbitrary-precision numbers
// enabled a plain i64 cannot be read back from that buffer; go through Value.
fn optional_version<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("expected_version must be an integer")),
        Some(other) => other
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected_version must be an integer")),
    }
}

/// Body of approve/reject
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Price a draft without saving
/// POST /quotes/preview
pub async fn preview_quote(
    service: web::Data<Arc<QuoteService>>,
    _principal: Principal,
    request: web::Json<QuoteDraft>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(service.preview(&request)))
}

/// POST /quotes
pub async fn create_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    request_id: CorrelationId,
    request: web::Json<QuoteDraft>,
) -> Result<HttpResponse, AppError> {
    let quote = service.create_quote(request.into_inner(), &principal).await?;
    tracing::info!(
        request_id = %request_id,
        quote_id = %quote.id,
        quote_number = %quote.quote_number,
        "Quote created via API"
    );
    Ok(HttpResponse::Created().json(quote))
}

/// GET /quotes
pub async fn list_quotes(
    service: web::Data<Arc<QuoteService>>,
    _principal: Principal,
    query: web::Query<QuoteFilter>,
) -> Result<HttpResponse, AppError> {
    let quotes = service.list_quotes(&query).await?;
    Ok(HttpResponse::Ok().json(quotes))
}

/// GET /quotes/{id}
pub async fn get_quote(
    service: web::Data<Arc<QuoteService>>,
    _principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.get_quote(&path).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// PUT /quotes/{id}
pub async fn update_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    request_id: CorrelationId,
    path: web::Path<String>,
    request: web::Json<UpdateQuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let UpdateQuoteRequest {
        draft,
        expected_version,
    } = request.into_inner();

    let quote = service
        .update_quote(&path, draft, &principal, expected_version)
        .await
        .inspect_err(|e| {
            if matches!(e, AppError::Conflict(_)) {
                tracing::warn!(request_id = %request_id, quote_id = %path, "Quote update lost a version race");
            }
        })?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /quotes/{id}/request-approval
pub async fn request_approval(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.request_approval(&path, &principal).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /quotes/{id}/approve
pub async fn approve_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    path: web::Path<String>,
    request: Option<web::Json<DecisionRequest>>,
) -> Result<HttpResponse, AppError> {
    let notes = request.and_then(|r| r.into_inner().notes);
    let quote = service.approve(&path, notes, &principal).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /quotes/{id}/reject
pub async fn reject_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    path: web::Path<String>,
    request: Option<web::Json<DecisionRequest>>,
) -> Result<HttpResponse, AppError> {
    let notes = request.and_then(|r| r.into_inner().notes);
    let quote = service.reject(&path, notes, &principal).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /quotes/{id}/send
pub async fn send_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.send_to_client(&path, &principal).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// POST /quotes/{id}/accept
pub async fn accept_quote(
    service: web::Data<Arc<QuoteService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.accept(&path, &principal).await?;
    Ok(HttpResponse::Ok().json(quote))
}

/// GET /quotes/{id}/revisions
pub async fn list_revisions(
    service: web::Data<Arc<QuoteService>>,
    _principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let revisions = service.list_revisions(&path).await?;
    Ok(HttpResponse::Ok().json(revisions))
}

/// GET /quotes/{id}/category-breakdown
pub async fn category_breakdown(
    service: web::Data<Arc<QuoteService>>,
    _principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let breakdown = service.category_breakdown(&path).await?;
    Ok(HttpResponse::Ok().json(breakdown))
}

/// Configure quote routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("/preview", web::post().to(preview_quote))
            .route("", web::post().to(create_quote))
            .route("", web::get().to(list_quotes))
            .route("/{id}", web::get().to(get_quote))
            .route("/{id}", web::put().to(update_quote))
            .route("/{id}/request-approval", web::post().to(request_approval))
            .route("/{id}/approve", web::post().to(approve_quote))
            .route("/{id}/reject", web::post().to(reject_quote))
            .route("/{id}/send", web::post().to(send_quote))
            .route("/{id}/accept", web::post().to(accept_quote))
            .route("/{id}/revisions", web::get().to(list_revisions))
            .route("/{id}/category-breakdown", web::get().to(category_breakdown)),
    );
}
