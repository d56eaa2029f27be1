//! HTTP-level tests for item checks, collection pages, history and the
//! public status endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use doccheck_db::repositories::CheckRepo;

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

#[tokio::test]
async fn item_check_reports_found_missing_and_invalid() {
    let test = common::build_test_app(false).await;

    let response = test.post_form("/api/v1/checks/item", &[("item_id", "42")]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let data = &json["data"];
    assert_eq!(data["status"], "incomplete");
    assert_eq!(data["item_id"], 42);
    assert_eq!(data["summary"]["total_attachments"], 2);
    assert_eq!(data["summary"]["found_documents"], 1);
    assert_eq!(data["summary"]["missing_documents"], 1);
    assert_eq!(data["summary"]["invalid_documents"], 1);
    assert_eq!(data["attachment_files"][1], "recibo.pdf");
    assert!(data["html"].as_str().unwrap().contains("comprovante_endereco"));
    assert!(data.get("email_sent").is_none());
    assert!(data.get("debug").is_none());

    assert_eq!(CheckRepo::count_for_item(&test.pool, 42).await.unwrap(), 1);
}

#[tokio::test]
async fn item_check_rejects_missing_ids() {
    let test = common::build_test_app(false).await;

    for item_id in ["0", "", "abc"] {
        let response = test
            .post_form("/api/v1/checks/item", &[("item_id", item_id)])
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["message"], "Invalid item ID.");
    }
}

#[tokio::test]
async fn item_fetch_failure_is_an_error_envelope() {
    let test = common::build_test_app(false).await;

    let response = test.post_form("/api/v1/checks/item", &[("item_id", "99")]).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["data"]["message"].as_str().unwrap().contains("timed out"));
    assert_eq!(CheckRepo::count_for_item(&test.pool, 99).await.unwrap(), 0);
}

#[tokio::test]
async fn item_check_can_notify_the_owner() {
    let test = common::build_test_app(true).await;

    let response = test
        .post_form("/api/v1/checks/item", &[("item_id", "42"), ("send_email", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email_sent"], true);
    assert_eq!(
        json["data"]["email_message"],
        "Email notification sent successfully."
    );
    assert_eq!(test.mailer.count(), 1);
}

#[tokio::test]
async fn complete_items_never_trigger_email() {
    let test = common::build_test_app(true).await;

    let response = test
        .post_form("/api/v1/checks/item", &[("item_id", "43"), ("send_email", "1")])
        .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "complete");
    assert!(json["data"].get("email_sent").is_none());
    assert_eq!(test.mailer.count(), 0);
}

// ---------------------------------------------------------------------------
// Collection pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collection_page_aggregates_statuses() {
    let test = common::build_test_app(false).await;

    let response = test
        .post_form(
            "/api/v1/checks/collection",
            &[("collection_id", "7"), ("page", "1"), ("per_page", "20")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["page"], 1);
    assert_eq!(data["total_pages"], 1);
    assert_eq!(data["total_items"], 2);
    assert_eq!(data["has_more"], false);
    assert_eq!(data["progress"], 100);
    assert_eq!(data["summary"]["complete"], 1);
    assert_eq!(data["summary"]["incomplete"], 1);
    assert_eq!(data["summary"]["error"], 0);
    assert!(data["html"].as_str().unwrap().contains("Batch Check Results"));
}

#[tokio::test]
async fn collection_paging_reports_progress() {
    let test = common::build_test_app(false).await;

    let response = test
        .post_form(
            "/api/v1/checks/collection",
            &[("collection_id", "7"), ("page", "1"), ("per_page", "1")],
        )
        .await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_pages"], 2);
    assert_eq!(data["has_more"], true);
    assert_eq!(data["progress"], 50);
}

#[tokio::test]
async fn collection_check_requires_a_collection() {
    let test = common::build_test_app(false).await;

    let response = test.post_form("/api/v1/checks/collection", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "Invalid collection ID.");
}

#[tokio::test]
async fn collection_page_sends_grouped_notifications() {
    let test = common::build_test_app(true).await;

    let response = test
        .post_form(
            "/api/v1/checks/collection",
            &[("collection_id", "7"), ("send_emails", "1")],
        )
        .await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["email_stats"]["emails_sent"], 1);
    assert_eq!(data["email_stats"]["users_notified"][0], 12);
    assert_eq!(data["email_message"], "Email notifications: 1 sent, 0 failed.");
    assert_eq!(test.mailer.count(), 1);
}

#[tokio::test]
async fn every_page_notifies_its_own_items() {
    let test = common::build_test_app(true).await;

    let response = test
        .post_form(
            "/api/v1/checks/collection",
            &[("collection_id", "7"), ("page", "1"), ("per_page", "1"), ("send_emails", "1")],
        )
        .await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["has_more"], true);
    assert_eq!(data["email_stats"]["emails_sent"], 1);
    assert_eq!(test.mailer.count(), 1);
    let sent = test.mailer.sent.lock().unwrap().clone();
    assert!(sent[0].body.contains("Item 42 (ID: 42)"));

    let response = test
        .post_form(
            "/api/v1/checks/collection",
            &[("collection_id", "7"), ("page", "2"), ("per_page", "1"), ("send_emails", "1")],
        )
        .await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["has_more"], false);
    assert_eq!(data["email_stats"]["emails_sent"], 0);
    assert_eq!(test.mailer.count(), 1);
}

// ---------------------------------------------------------------------------
// History and public status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_lists_recorded_checks() {
    let test = common::build_test_app(false).await;

    let response = test.post_form("/api/v1/checks/history", &[("item_id", "42")]).await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["count"], 0);
    assert!(data["html"]
        .as_str()
        .unwrap()
        .contains("No history found for this item."));

    test.post_form("/api/v1/checks/item", &[("item_id", "42")]).await;
    test.post_form("/api/v1/checks/item", &[("item_id", "42")]).await;

    let response = test.post_form("/api/v1/checks/history", &[("item_id", "42")]).await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["count"], 2);
    assert_eq!(data["history"][0]["status"], "incomplete");
    assert_eq!(data["history"][0]["missing_documents"][0], "comprovante_endereco");
}

#[tokio::test]
async fn public_status_shows_latest_check() {
    let test = common::build_test_app(false).await;

    let response = get(test.app.clone(), "/api/v1/status/42").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test.post_form("/api/v1/checks/item", &[("item_id", "42")]).await;

    let response = get(test.app.clone(), "/api/v1/status/42").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "incomplete");
    assert_eq!(data["found_documents"][0], "documento_identidade");
    assert!(data["html"].as_str().unwrap().contains("Action Required:"));
}
