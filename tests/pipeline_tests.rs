//! The invoice pipeline end to end: documents, delivery and provenance.

mod common;

use axum::http::StatusCode;
use common::{TestApp, spawn_app};
use marketbook::domain::{ItemId, UserId};
use sea_orm::ConnectionTrait;
use serde_json::{Value, json};
use std::sync::atomic::Ordering;

async fn user_id(app: &TestApp, token: &str) -> UserId {
    app.state.shared.auth.authenticate(token).await.unwrap().id
}

fn item_id(item: &Value) -> i64 {
    item["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_chair_scenario() {
    let app = spawn_app().await;
    let token = app.register("Ada Stores", "ada@example.com").await;

    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 99.99, "customerEmail": "c@x.com" }),
        )
        .await;
    assert_eq!(item["status"], "pending");
    let id = item_id(&item);

    let (status, body) = app
        .call("POST", &format!("/api/items/{id}/invoice"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["invoiceNumber"], format!("INV-{id:06}"));
    assert_eq!(body["data"]["fileName"], format!("invoice-{id}.pdf"));
    assert_eq!(body["data"]["mediaType"], "application/pdf");
    assert!(
        body["data"]["pdf"]
            .as_str()
            .unwrap()
            .starts_with("data:application/pdf;base64,")
    );

    {
        let documents = app.renderer.documents.lock().unwrap();
        let document = &documents[0];
        assert_eq!(document.money(document.total), "₦99.99");
        assert_eq!(document.status_label, "Pending");
        assert_eq!(document.bill_to.email.as_deref(), Some("c@x.com"));
        assert_eq!(document.issuer.name, "Ada Stores");
    }

    let (status, body) = app
        .call("POST", &format!("/api/items/{id}/send-email"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sentTo"], "c@x.com");
    assert_eq!(body["data"]["subject"], "Invoice for Chair");

    {
        let sent = app.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "c@x.com");
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].attachments[0].file_name, format!("invoice-{id}.pdf"));
        assert_eq!(sent[0].attachments[0].content_type, "application/pdf");
        assert!(sent[0].html_body.contains("₦99.99"));
    }

    let actions = app.audit_actions(&token).await;
    assert_eq!(actions.iter().filter(|a| *a == "EMAIL_SENT").count(), 1);
    assert_eq!(
        actions.iter().filter(|a| *a == "INVOICE_GENERATED").count(),
        1
    );
}

#[tokio::test]
async fn test_creation_records_provenance_for_the_item() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;

    let item = app
        .create_item(&token, json!({ "title": "Desk", "amount": 0 }))
        .await;
    let id = i32::try_from(item_id(&item)).unwrap();
    let owner = user_id(&app, &token).await;
    assert_eq!(item["user"]["id"], owner.value());

    let entries = app
        .state
        .store()
        .audit_repo()
        .for_item(owner, ItemId::new(id))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "ITEM_CREATED");
    assert_eq!(entries[0].details, "Created item: Desk");
    assert_eq!(entries[0].user_agent, "marketbook-tests");
}

#[tokio::test]
async fn test_invoice_is_deterministic_for_a_frozen_clock() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(&token, json!({ "title": "Chair", "amount": "1234.5", "status": "paid" }))
        .await;
    let id = item_id(&item);

    let (_, first) = app
        .call("POST", &format!("/api/items/{id}/invoice"), Some(&token), None)
        .await;
    let (_, second) = app
        .call("POST", &format!("/api/items/{id}/invoice"), Some(&token), None)
        .await;
    assert_eq!(first, second);

    let documents = app.renderer.documents.lock().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0], documents[1]);
    assert_eq!(documents[0].money(documents[0].total), "₦1,234.50");
    assert_eq!(documents[0].status_label, "Paid");
    // Due date is 30 days after the frozen instant
    assert_eq!(documents[0].due_date, "03/31/2026");
}

#[tokio::test]
async fn test_send_without_customer_email_does_nothing() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(&token, json!({ "title": "Chair", "amount": 10 }))
        .await;
    let id = item_id(&item);
    let before = app.audit_actions(&token).await;

    let (status, body) = app
        .call("POST", &format!("/api/items/{id}/send-email"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert_eq!(app.renderer.calls(), 0);
    assert_eq!(app.mailer.sent_count(), 0);
    assert_eq!(app.audit_actions(&token).await, before);
}

#[tokio::test]
async fn test_render_failure_is_reported_and_not_recorded() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 10, "customerEmail": "c@x.com" }),
        )
        .await;
    let id = item_id(&item);
    app.renderer.fail.store(true, Ordering::SeqCst);

    let (status, body) = app
        .call("POST", &format!("/api/items/{id}/invoice"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "RENDER_FAILURE");
    // Backend detail stays in the logs
    assert!(!body["error"].as_str().unwrap().contains("boom"));

    let (status, _) = app
        .call("POST", &format!("/api/items/{id}/send-email"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.mailer.sent_count(), 0);

    let actions = app.audit_actions(&token).await;
    assert!(!actions.contains(&"INVOICE_GENERATED".to_string()));
    assert!(!actions.contains(&"EMAIL_SENT".to_string()));
}

#[tokio::test]
async fn test_delivery_failure_is_reported_and_not_recorded() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 10, "customerEmail": "c@x.com" }),
        )
        .await;
    app.mailer.fail.store(true, Ordering::SeqCst);

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/items/{}/send-email", item_id(&item)),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "DELIVERY_FAILURE");
    assert!(!app.audit_actions(&token).await.contains(&"EMAIL_SENT".to_string()));
}

#[tokio::test]
async fn test_delete_records_exactly_one_entry_with_the_title() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 10, "customerName": "Bola" }),
        )
        .await;
    let id = item_id(&item);

    let (status, _) = app
        .call("DELETE", &format!("/api/items/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("DELETE", &format!("/api/items/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let owner = user_id(&app, &token).await;
    let deleted: Vec<_> = app
        .state
        .store()
        .audit_repo()
        .recent_for_user(owner, 100)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.action == "ITEM_DELETED")
        .collect();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].details, "Deleted item: Chair (customer: Bola)");
}

#[tokio::test]
async fn test_update_clears_blank_optional_fields() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;
    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 10, "customerName": "Bola", "description": "Oak" }),
        )
        .await;

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/items/{}", item_id(&item)),
            Some(&token),
            Some(json!({ "title": "Chair", "amount": 10, "customerName": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["customerName"].is_null());
    assert_eq!(body["data"]["description"], "Oak");
}

#[tokio::test]
async fn test_provenance_failure_does_not_fail_the_operation() {
    let app = spawn_app().await;
    let token = app.register("Ada", "ada@example.com").await;

    app.state
        .store()
        .conn
        .execute_unprepared("DROP TABLE audit_logs")
        .await
        .unwrap();

    let item = app
        .create_item(
            &token,
            json!({ "title": "Chair", "amount": 10, "customerEmail": "c@x.com" }),
        )
        .await;

    let (status, _) = app
        .call(
            "POST",
            &format!("/api/items/{}/send-email", item_id(&item)),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.sent_count(), 1);

    // The notification half is still written
    let (_, body) = app.call("GET", "/api/notifications", Some(&token), None).await;
    let messages: Vec<&str> = body["data"]["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["message"].as_str())
        .collect();
    assert!(messages.iter().any(|m| m.contains("sent to c@x.com")));
}
