//! Purchase orders: lines, totals and receipt into stock.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn create_order(app: &TestApp, supplier_id: i32, lines: Value) -> Value {
    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier_id,
                "expected_delivery_date": "2026-11-20",
                "lines": lines
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn lines_of(app: &TestApp, order_id: i64) -> Vec<Value> {
    let (status, body) = app
        .call(
            &app.admin,
            Method::GET,
            &format!("/api/v1/purchase-orders/{}/details", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].as_array().cloned().unwrap_or_default()
}

async fn set_received(app: &TestApp, line_id: &Value, quantity: i32) -> (StatusCode, Value) {
    app.call(
        &app.admin,
        Method::PATCH,
        &format!("/api/v1/purchase-order-details/{}/received", line_id),
        Some(json!({ "received_quantity": quantity })),
    )
    .await
}

#[tokio::test]
async fn receiving_an_order_adds_stock_per_received_line() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Norte").await;
    let pads = app.create_item("PO-PADS", 2, 4).await;
    let filters = app.create_item("PO-FILT", 10, 4).await;
    let plugs = app.create_item("PO-PLUG", 6, 4).await;

    let order = create_order(
        &app,
        supplier.id,
        json!([
            { "item_id": pads.id, "ordered_quantity": 10, "unit_price": "400.00" },
            { "item_id": filters.id, "ordered_quantity": 5, "unit_price": "70.00" },
            { "item_id": plugs.id, "ordered_quantity": 8 }
        ]),
    )
    .await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["status"], "pendiente");
    // plugs fall back to the item's purchase price of 80.00
    assert_eq!(decimal(&order["total"]), dec!(4990.00));

    let lines = lines_of(&app, order_id).await;
    assert_eq!(lines.len(), 3);

    let (status, body) = set_received(&app, &lines[0]["id"], 10).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "completado");

    let (_, body) = set_received(&app, &lines[1]["id"], 3).await;
    assert_eq!(body["data"]["status"], "parcial");

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/receive", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order"]["status"], "recibido");
    assert!(!body["data"]["order"]["received_date"].is_null());
    assert_eq!(body["data"]["movements"].as_array().map(Vec::len), Some(2));

    assert_eq!(app.stock_of(pads.id).await, 12);
    assert_eq!(app.stock_of(filters.id).await, 13);
    assert_eq!(app.stock_of(plugs.id).await, 6);

    let movements = app
        .state
        .services
        .stock_movements
        .by_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements
        .iter()
        .all(|m| m.user_id == app.admin.id() && m.supplier_id == Some(supplier.id)));
}

#[tokio::test]
async fn received_orders_are_frozen() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Sur").await;
    let item = app.create_item("PO-FRZ", 0, 1).await;

    let order = create_order(
        &app,
        supplier.id,
        json!([{ "item_id": item.id, "ordered_quantity": 4, "unit_price": "10.00" }]),
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();
    let lines = lines_of(&app, order_id).await;
    set_received(&app, &lines[0]["id"], 4).await;

    let receive_uri = format!("/api/v1/purchase-orders/{}/receive", order_id);
    let (status, _) = app.call(&app.admin, Method::POST, &receive_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_of(item.id).await, 4);

    let (status, _) = app.call(&app.admin, Method::POST, &receive_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "second receipt");
    assert_eq!(app.stock_of(item.id).await, 4, "stock not added twice");

    let (status, _) = set_received(&app, &lines[0]["id"], 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.admin,
            Method::POST,
            "/api/v1/purchase-order-details",
            Some(json!({
                "purchase_order_id": order_id,
                "item_id": item.id,
                "ordered_quantity": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/purchase-orders/{}", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_received_quantity_is_rejected() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Este").await;
    let item = app.create_item("PO-NEG", 0, 1).await;
    let order = create_order(
        &app,
        supplier.id,
        json!([{ "item_id": item.id, "ordered_quantity": 2 }]),
    )
    .await;
    let lines = lines_of(&app, order["id"].as_i64().unwrap()).await;

    let (status, _) = set_received(&app, &lines[0]["id"], -1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn purchase_orders_are_admin_only() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(&app.mechanic, Method::GET, "/api/v1/purchase-orders", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(&app.customer, Method::GET, "/api/v1/suppliers", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn raising_the_ordered_quantity_reopens_a_completed_line() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Centro").await;
    let item = app.create_item("PO-RAISE", 0, 1).await;

    let order = create_order(
        &app,
        supplier.id,
        json!([{ "item_id": item.id, "ordered_quantity": 5, "unit_price": "12.00" }]),
    )
    .await;
    let lines = lines_of(&app, order["id"].as_i64().unwrap()).await;
    let line_id = &lines[0]["id"];

    let (_, body) = set_received(&app, line_id, 5).await;
    assert_eq!(body["data"]["status"], "completado");

    let (status, body) = app
        .call(
            &app.admin,
            Method::PUT,
            &format!("/api/v1/purchase-order-details/{}", line_id),
            Some(json!({ "ordered_quantity": 20 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "parcial");
    assert_eq!(body["data"]["received_quantity"], 5);
}

#[tokio::test]
async fn zero_received_quantity_keeps_the_line_status() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Oriente").await;
    let item = app.create_item("PO-ZERO", 0, 1).await;

    let order = create_order(
        &app,
        supplier.id,
        json!([{ "item_id": item.id, "ordered_quantity": 6, "unit_price": "9.00" }]),
    )
    .await;
    let lines = lines_of(&app, order["id"].as_i64().unwrap()).await;
    let line_id = lines[0]["id"].as_i64().unwrap() as i32;

    let details = &app.state.services.purchase_order_details;
    let untouched = details.update_received_quantity(line_id, 0).await.unwrap();
    assert_eq!(untouched.status.to_string(), "pendiente");
    assert_eq!(untouched.received_quantity, 0);

    details.update_received_quantity(line_id, 2).await.unwrap();
    let rolled_back = details.update_received_quantity(line_id, 0).await.unwrap();
    assert_eq!(rolled_back.status.to_string(), "parcial");
    assert_eq!(rolled_back.received_quantity, 0);
}

#[tokio::test]
async fn receipt_records_the_supplier_invoice() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("Refaccionaria Poniente").await;
    let item = app.create_item("PO-INV", 1, 1).await;

    let order = create_order(
        &app,
        supplier.id,
        json!([{ "item_id": item.id, "ordered_quantity": 3, "unit_price": "25.00" }]),
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();
    let lines = lines_of(&app, order_id).await;
    set_received(&app, &lines[0]["id"], 3).await;

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/receive", order_id),
            Some(json!({ "invoice_numbr": "F-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unknown field: {body}");

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/receive", order_id),
            Some(json!({ "invoice_number": "FAC-2026-0117" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(app.stock_of(item.id).await, 4);

    let movements = app
        .state
        .services
        .stock_movements
        .by_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].invoice_number.as_deref(), Some("FAC-2026-0117"));
}
