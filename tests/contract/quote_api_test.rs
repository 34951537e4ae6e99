// HTTP contract for the quote API
//
// Runs the real routes, middleware and extractor config against the
// in-memory store; tokens resolve through a static table.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use actix_web::{
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test, web, App,
};
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use quotebuilder::middleware::{configure_extractors, BearerAuth, RequestId};
use quotebuilder::modules::health;
use quotebuilder::modules::pricing::CategorySubtotal;
use quotebuilder::modules::quotes::controllers::configure;
use quotebuilder::modules::quotes::models::{Quote, QuotePreview, QuoteRevision, QuoteStatus};

const SALES: &str = "sales-token";
const MANAGER: &str = "manager-token";
const ADMIN: &str = "admin-token";

/// Full application over a freshly seeded in-memory store
macro_rules! quote_app {
    () => {{
        let store = seeded_store();
        let service = Arc::new(service_for(&store));
        let resolver = Arc::new(
            StaticIdentityResolver::default()
                .with(SALES, sales_rep())
                .with(MANAGER, manager())
                .with(ADMIN, admin()),
        );

        test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .wrap(BearerAuth::new(resolver))
                .wrap(RequestId)
                .configure(configure_extractors)
                .configure(health::configure)
                .configure(configure),
        )
        .await
    }};
}

/// Status of a call whose error may surface from middleware
async fn status_of<S, R, B>(app: &S, req: R) -> StatusCode
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}

fn desk_payload() -> Value {
    json!({
        "title": "Office fit-out",
        "client_id": CLIENT_ID,
        "discount_mode": "LINE_ITEM",
        "items": [
            {"product_id": "desk", "quantity": 10, "rate": 100, "discount_percent": 10}
        ],
        "policies": [
            {"clause_type": "payment", "title": "Net 30", "description": "Payable within 30 days"}
        ]
    })
}

fn post(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

fn get(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = quote_app!();
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_quotes_require_a_valid_token() {
    let app = quote_app!();

    let req = test::TestRequest::get().uri("/quotes").to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);

    let req = get("/quotes", "stolen").to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);

    let req = get("/quotes", SALES).to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::OK);
}

#[actix_web::test]
async fn test_preview_prices_without_saving() {
    let app = quote_app!();

    let mut payload = desk_payload();
    payload["discount_mode"] = json!("OVERALL");
    payload["overall_discount_percent"] = json!("20");

    let req = post("/quotes/preview", SALES).set_json(&payload).to_request();
    let preview: QuotePreview = test::call_and_read_body_json(&app, req).await;

    assert_eq!(preview.lines.len(), 1);
    assert_eq!(preview.lines[0].line_total, dec!(1000));
    assert_eq!(preview.totals.subtotal, dec!(1000));
    assert_eq!(preview.totals.discount_amount, dec!(200));
    assert_eq!(preview.totals.net_amount, dec!(800));
    assert_eq!(preview.totals.tax_amount, dec!(144));
    assert_eq!(preview.totals.grand_total, dec!(944));

    let req = get("/quotes", SALES).to_request();
    let quotes: Vec<Quote> = test::call_and_read_body_json(&app, req).await;
    assert!(quotes.is_empty());
}

#[actix_web::test]
async fn test_create_and_fetch() {
    let app = quote_app!();

    let req = post("/quotes", SALES).set_json(desk_payload()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Quote = test::read_body_json(resp).await;

    assert_eq!(created.status, QuoteStatus::Draft);
    assert_eq!(created.grand_total, dec!(1062));
    assert_eq!(created.policies.len(), 1);
    assert!(created.policies[0].is_active);

    let req = get(&format!("/quotes/{}", created.id), SALES).to_request();
    let fetched: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);
}

#[actix_web::test]
async fn test_error_bodies() {
    let app = quote_app!();

    let req = get("/quotes/does-not-exist", SALES).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 404);

    let mut untitled = desk_payload();
    untitled["title"] = json!("");
    let req = post("/quotes", SALES).set_json(&untitled).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Validation error: Quote title is required");

    let req = post("/quotes", SALES)
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = get("/quotes?status=ARCHIVED", SALES).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_approval_flow_over_http() {
    let app = quote_app!();

    let req = post("/quotes", SALES).set_json(desk_payload()).to_request();
    let created: Quote = test::call_and_read_body_json(&app, req).await;
    let base = format!("/quotes/{}", created.id);

    let req = post(&format!("{}/request-approval", base), SALES).to_request();
    let pending: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.status, QuoteStatus::PendingApproval);

    let req = post(&format!("{}/approve", base), SALES).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = post(&format!("{}/approve", base), MANAGER)
        .set_json(json!({"notes": "Good margin"}))
        .to_request();
    let sent: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(sent.status, QuoteStatus::Sent);
    assert_eq!(sent.approval_notes.as_deref(), Some("Good margin"));

    let req = post(&format!("{}/approve", base), MANAGER).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Illegal transition: Quote must be in PENDING_APPROVAL status; current status: SENT"
    );

    let req = post(&format!("{}/send", base), SALES).to_request();
    let resent: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resent.sent_at, sent.sent_at);

    let req = post(&format!("{}/accept", base), SALES).to_request();
    let accepted: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted.status, QuoteStatus::Accepted);
}

#[actix_web::test]
async fn test_reject_and_bypass_send() {
    let app = quote_app!();

    let req = post("/quotes", SALES).set_json(desk_payload()).to_request();
    let first: Quote = test::call_and_read_body_json(&app, req).await;
    let req = post(&format!("/quotes/{}/request-approval", first.id), SALES).to_request();
    test::call_service(&app, req).await;
    let req = post(&format!("/quotes/{}/reject", first.id), MANAGER)
        .set_json(json!({"notes": "Too cheap"}))
        .to_request();
    let rejected: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rejected.status, QuoteStatus::Rejected);

    let req = post("/quotes", SALES).set_json(desk_payload()).to_request();
    let second: Quote = test::call_and_read_body_json(&app, req).await;

    let req = post(&format!("/quotes/{}/send", second.id), SALES).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = post(&format!("/quotes/{}/send", second.id), ADMIN).to_request();
    let sent: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(sent.status, QuoteStatus::Sent);
    assert!(!sent.is_approved);
}

#[actix_web::test]
async fn test_update_revisions_and_version_conflict() {
    let app = quote_app!();

    let req = post("/quotes", SALES).set_json(desk_payload()).to_request();
    let created: Quote = test::call_and_read_body_json(&app, req).await;
    let base = format!("/quotes/{}", created.id);

    let mut update = desk_payload();
    update["title"] = json!("Office fit-out, phase 2");
    update["expected_version"] = json!(1);
    let req = test::TestRequest::put()
        .uri(&base)
        .insert_header(("Authorization", format!("Bearer {}", SALES)))
        .set_json(&update)
        .to_request();
    let updated: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.version, 2);
    assert_eq!(updated.title, "Office fit-out, phase 2");
    assert_eq!(updated.quote_number, created.quote_number);

    let req = test::TestRequest::put()
        .uri(&base)
        .insert_header(("Authorization", format!("Bearer {}", MANAGER)))
        .set_json(&update)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = get(&format!("{}/revisions", base), SALES).to_request();
    let revisions: Vec<QuoteRevision> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].version, 1);
    assert_eq!(revisions[0].snapshot.title, "Office fit-out");
}

#[actix_web::test]
async fn test_category_breakdown_endpoint() {
    let app = quote_app!();

    let payload = json!({
        "title": "Campus refresh",
        "items": [
            {"product_id": "desk", "quantity": 2},
            {"product_id": "turf", "dimensions": {"length": 4, "width": 5}},
            {"product_id": "install", "quantity": "3"}
        ]
    });
    let req = post("/quotes", SALES).set_json(&payload).to_request();
    let created: Quote = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created.items[1].quantity, dec!(20));

    let req = get(&format!("/quotes/{}/category-breakdown", created.id), SALES).to_request();
    let breakdown: Vec<CategorySubtotal> = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Furniture", "Landscaping", "Uncategorized"]);
    let total: rust_decimal::Decimal = breakdown.iter().map(|c| c.subtotal).sum();
    assert_eq!(total, created.subtotal);
}
