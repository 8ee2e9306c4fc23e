//! Stock ledger behaviour through the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn entrada_and_salida_move_stock_and_record_movements() {
    let app = TestApp::new().await;
    let item = app.create_item("BAL-001", 10, 2).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory/{}/stock", item.id),
            Some(json!({
                "quantity": 5,
                "movement_type": "entrada",
                "motive": "restock from counter"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["item"]["stock_quantity"], 15);
    assert_eq!(body["data"]["movement"]["movement_type"], "entrada");
    assert_eq!(body["data"]["movement"]["user_id"], app.mechanic.id());

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/inventory-movements",
            Some(json!({
                "item_id": item.id,
                "quantity": 4,
                "movement_type": "salida",
                "motive": "used on brake job"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["item"]["stock_quantity"], 11);

    assert_eq!(app.stock_of(item.id).await, 11);

    let (status, body) = app
        .call(
            &app.admin,
            Method::GET,
            &format!("/api/v1/inventory/{}/movements", item.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let movements = body["data"].as_array().expect("movement list");
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["movement_type"], "salida", "newest first");
}

#[tokio::test]
async fn salida_beyond_stock_is_rejected_and_leaves_no_trace() {
    let app = TestApp::new().await;
    let item = app.create_item("FIL-002", 3, 1).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory/{}/stock", item.id),
            Some(json!({
                "quantity": 4,
                "movement_type": "salida",
                "motive": "oil change"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("3 units"),
        "unexpected error body: {body}"
    );

    assert_eq!(app.stock_of(item.id).await, 3);
    let movements = app
        .state
        .services
        .stock_movements
        .by_item(item.id)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn salida_of_exact_stock_reaches_zero() {
    let app = TestApp::new().await;
    let item = app.create_item("BUJ-003", 4, 0).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory/{}/stock", item.id),
            Some(json!({
                "quantity": 4,
                "movement_type": "salida",
                "motive": "spark plug set"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["item"]["stock_quantity"], 0);
}

#[tokio::test]
async fn non_positive_quantities_are_validation_errors() {
    let app = TestApp::new().await;
    let item = app.create_item("ACE-004", 10, 2).await;

    for quantity in [0, -3] {
        let (status, _) = app
            .call(
                &app.mechanic,
                Method::PATCH,
                &format!("/api/v1/inventory/{}/stock", item.id),
                Some(json!({
                    "quantity": quantity,
                    "movement_type": "entrada",
                    "motive": "bad input"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "quantity {quantity}");
    }
    assert_eq!(app.stock_of(item.id).await, 10);
}

#[tokio::test]
async fn adjusting_an_unknown_item_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            "/api/v1/inventory/9999/stock",
            Some(json!({
                "quantity": 1,
                "movement_type": "entrada",
                "motive": "ghost"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/inventory-movements",
            Some(json!({
                "item_id": 9999,
                "quantity": 1,
                "movement_type": "entrada",
                "motive": "ghost"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn low_stock_lists_items_at_or_below_minimum() {
    let app = TestApp::new().await;
    let at_minimum = app.create_item("LOW-001", 5, 5).await;
    let below = app.create_item("LOW-002", 1, 3).await;
    app.create_item("OK-003", 20, 5).await;

    let (status, body) = app
        .call(&app.admin, Method::GET, "/api/v1/inventory/low-stock", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<i64> = body["data"]
        .as_array()
        .expect("item list")
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![at_minimum.id as i64, below.id as i64]);
}

#[tokio::test]
async fn item_with_movements_cannot_be_deleted() {
    let app = TestApp::new().await;
    let moved = app.create_item("DEL-001", 5, 1).await;
    let idle = app.create_item("DEL-002", 5, 1).await;

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory/{}/stock", moved.id),
            Some(json!({
                "quantity": 1,
                "movement_type": "salida",
                "motive": "used"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/inventory/{}", moved.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/inventory/{}", idle.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn item_update_does_not_accept_stock_quantity() {
    let app = TestApp::new().await;
    let item = app.create_item("UPD-001", 7, 1).await;

    let (status, _) = app
        .call(
            &app.admin,
            Method::PUT,
            &format!("/api/v1/inventory/{}", item.id),
            Some(json!({ "stock_quantity": 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(item.id).await, 7);
}

#[tokio::test]
async fn movement_notes_can_be_edited_but_not_quantities() {
    let app = TestApp::new().await;
    let item = app.create_item("NOT-001", 7, 1).await;

    let (_, body) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory/{}/stock", item.id),
            Some(json!({
                "quantity": 2,
                "movement_type": "entrada",
                "motive": "counter return"
            })),
        )
        .await;
    let movement_id = body["data"]["movement"]["id"].as_i64().expect("movement id");

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory-movements/{}", movement_id),
            Some(json!({ "invoice_number": "F-1029" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["invoice_number"], "F-1029");

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::PATCH,
            &format!("/api/v1/inventory-movements/{}", movement_id),
            Some(json!({ "quantity": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(item.id).await, 9);
}
