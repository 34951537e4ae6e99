// Revision ledger: one snapshot per content update, newest first, with
// optimistic version checks.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::Utc;
use helpers::*;
use rust_decimal_macros::dec;

use quotebuilder::core::AppError;
use quotebuilder::modules::pricing::DiscountMode;
use quotebuilder::modules::quotes::models::{QuoteRevision, QuoteStatus};
use quotebuilder::modules::quotes::{QuoteRepository, RevisionRepository};

#[tokio::test]
async fn test_each_update_snapshots_the_previous_version() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();

    let mut second = desk_draft();
    second.discount_mode = DiscountMode::Overall;
    second.overall_discount_percent = dec!(20);
    let v2 = service
        .update_quote(&quote.id, second, &sales_rep(), Some(1))
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.grand_total, dec!(944));

    let v3 = service
        .update_quote(&quote.id, desk_draft(), &manager(), None)
        .await
        .unwrap();
    assert_eq!(v3.version, 3);

    let revisions = service.list_revisions(&quote.id).await.unwrap();
    let versions: Vec<i64> = revisions.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![2, 1]);

    assert_eq!(revisions[0].created_by, "user-manager");
    assert_eq!(revisions[0].snapshot.discount_mode, DiscountMode::Overall);
    assert_eq!(revisions[0].snapshot.totals.grand_total, dec!(944));

    assert_eq!(revisions[1].created_by, "user-sales");
    assert_eq!(revisions[1].snapshot.totals.grand_total, dec!(1062));
    assert_eq!(revisions[1].snapshot.items.len(), 1);
}

#[tokio::test]
async fn test_editing_a_sent_quote_redrafts_it() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();
    service.request_approval(&quote.id, &sales_rep()).await.unwrap();
    service.approve(&quote.id, None, &manager()).await.unwrap();

    let mut cheaper = desk_draft();
    cheaper.items[0].rate = Some(dec!(80));
    let redrafted = service
        .update_quote(&quote.id, cheaper, &sales_rep(), Some(1))
        .await
        .unwrap();

    assert_eq!(redrafted.status, QuoteStatus::Draft);
    assert!(!redrafted.is_approved);
    assert_eq!(redrafted.approved_by, None);
    assert_eq!(redrafted.sent_at, None);
    assert_eq!(redrafted.version, 2);
    assert_eq!(redrafted.quote_number, quote.quote_number);

    let revisions = service.list_revisions(&quote.id).await.unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].snapshot.status, QuoteStatus::Sent);
    assert_eq!(revisions[0].snapshot.totals.grand_total, dec!(1062));
}

#[tokio::test]
async fn test_stale_expected_version_writes_nothing() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();
    service
        .update_quote(&quote.id, desk_draft(), &sales_rep(), Some(1))
        .await
        .unwrap();
    let before = store.stored(&quote.id).unwrap();

    let mut late_edit = desk_draft();
    late_edit.title = "Someone else's idea".to_string();
    let err = service
        .update_quote(&quote.id, late_edit, &manager(), Some(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.stored(&quote.id).unwrap(), before);
    assert_eq!(store.revision_count(), 1);
}

#[tokio::test]
async fn test_concurrent_writer_between_read_and_write_is_conflict() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();

    // Two editors both read version 1; the first one commits
    let stale = store.stored(&quote.id).unwrap();
    service
        .update_quote(&quote.id, desk_draft(), &sales_rep(), Some(1))
        .await
        .unwrap();

    let mut losing = stale.clone();
    losing.version = 2;
    losing.title = "Losing edit".to_string();
    let revision = QuoteRevision::capture(&stale, "user-manager", Utc::now());

    let repo: &dyn QuoteRepository = store.as_ref();
    let err = repo
        .update_content(&losing, &revision, 1, QuoteStatus::Draft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.stored(&quote.id).unwrap().title, "Office fit-out");
    assert_eq!(store.revision_count(), 1);
}

#[tokio::test]
async fn test_duplicate_append_is_conflict() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();

    let ledger: &dyn RevisionRepository = store.as_ref();
    let first = QuoteRevision::capture(&quote, "user-sales", Utc::now());
    ledger.append(&first).await.unwrap();

    let second = QuoteRevision::capture(&quote, "user-manager", Utc::now());
    assert!(matches!(ledger.append(&second).await, Err(AppError::Conflict(_))));

    let listed = ledger.list_for_quote(&quote.id).await.unwrap();
    assert_eq!(listed, vec![first]);
}

#[tokio::test]
async fn test_editing_an_accepted_quote_goes_through_the_ledger() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();
    service.send_to_client(&quote.id, &admin()).await.unwrap();
    let accepted = service.accept(&quote.id, &sales_rep()).await.unwrap();

    let mut amended = desk_draft();
    amended.items[0].quantity = dec!(12);
    let edited = service
        .update_quote(&quote.id, amended, &sales_rep(), Some(1))
        .await
        .unwrap();

    assert_eq!(edited.status, QuoteStatus::Accepted);
    assert_eq!(edited.accepted_at, accepted.accepted_at);
    assert_eq!(edited.version, 2);
    // 12 x 100 less 10% = 1080, +18%
    assert_eq!(edited.grand_total, dec!(1274.40));

    let revisions = service.list_revisions(&quote.id).await.unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].snapshot.status, QuoteStatus::Accepted);
    assert_eq!(revisions[0].snapshot.totals.grand_total, dec!(1062));
}

#[tokio::test]
async fn test_editing_a_pending_quote_keeps_it_pending() {
    let store = seeded_store();
    let service = service_for(&store);
    let quote = service.create_quote(desk_draft(), &sales_rep()).await.unwrap();
    service.request_approval(&quote.id, &sales_rep()).await.unwrap();

    let edited = service
        .update_quote(&quote.id, desk_draft(), &sales_rep(), Some(1))
        .await
        .unwrap();
    assert_eq!(edited.status, QuoteStatus::PendingApproval);
    assert_eq!(edited.version, 2);

    let approved = service.approve(&quote.id, None, &manager()).await.unwrap();
    assert_eq!(approved.status, QuoteStatus::Sent);
    assert_eq!(approved.version, 2);
}

#[tokio::test]
async fn test_revisions_of_unknown_quote_is_not_found() {
    let store = seeded_store();
    let service = service_for(&store);

    assert!(matches!(
        service.list_revisions("missing").await,
        Err(AppError::NotFound(_))
    ));
}
