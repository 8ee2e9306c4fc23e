//! Appointment to finalized service order, including the customer notification.

mod common;

use std::time::Duration;

use axum::{
    body::to_bytes,
    http::{header, Method, StatusCode},
};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn open_order(app: &TestApp, vehicle_id: i32, appointment_id: Option<i64>) -> Value {
    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/service-orders",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": vehicle_id,
                "appointment_id": appointment_id,
                "diagnosis": "front brakes worn"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn add_detail(app: &TestApp, order_id: i64, service_id: i32, price: &str) -> i64 {
    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({
                "order_id": order_id,
                "service_id": service_id,
                "mechanic_id": app.mechanic.id(),
                "price": price
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().expect("detail id")
}

async fn set_detail_status(app: &TestApp, detail_id: i64, status: &str) -> (StatusCode, Value) {
    app.call(
        &app.mechanic,
        Method::PATCH,
        &format!("/api/v1/order-details/{}/status", detail_id),
        Some(json!({ "status": status })),
    )
    .await
}

async fn wait_for_notifications(app: &TestApp, expected: usize) {
    for _ in 0..50 {
        if app.notifier.sent().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn full_lifecycle_from_appointment_to_finalized_order() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "ABC-123").await;
    let brakes = app.create_catalog_service("Cambio de balatas", dec!(900.00)).await;
    let alignment = app.create_catalog_service("Alineación", dec!(550.00)).await;

    let (status, body) = app
        .call(
            &app.customer,
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": car.id,
                "date": "2026-11-02",
                "service_type": "Frenos"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "programada");
    let appointment_id = body["data"]["id"].as_i64().expect("appointment id");

    let order = open_order(&app, car.id, Some(appointment_id)).await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["status"], "abierta");

    let (_, body) = app
        .call(
            &app.admin,
            Method::GET,
            &format!("/api/v1/appointments/{}", appointment_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["status"], "en_proceso");

    let first = add_detail(&app, order_id, brakes.id, "950.00").await;
    let second = add_detail(&app, order_id, alignment.id, "550.00").await;

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "pending details block finalization");

    let (status, _) = set_detail_status(&app, first, "completado").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(
            &app.mechanic,
            Method::GET,
            &format!("/api/v1/service-orders/{}", order_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["status"], "en progreso");

    let (status, _) = set_detail_status(&app, second, "en_proceso").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_detail_status(&app, second, "completado").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "finalizada");
    assert_eq!(decimal(&body["data"]["total"]), dec!(1500.00));
    assert_eq!(body["data"]["finalized_by"], app.mechanic.id());
    assert!(!body["data"]["end_date"].is_null());

    let (_, body) = app
        .call(
            &app.admin,
            Method::GET,
            &format!("/api/v1/appointments/{}", appointment_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["status"], "finalizada");

    wait_for_notifications(&app, 1).await;
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, app.customer.user.email);
    assert!(sent[0].subject.contains(&order_id.to_string()));
}

#[tokio::test]
async fn finalized_orders_reject_further_changes() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "FIN-001").await;
    let oil = app.create_catalog_service("Cambio de aceite", dec!(650.00)).await;

    let order = open_order(&app, car.id, None).await;
    let order_id = order["id"].as_i64().unwrap();
    let detail = add_detail(&app, order_id, oil.id, "650.00").await;
    set_detail_status(&app, detail, "completado").await;

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "finalizing twice");

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::PUT,
            &format!("/api/v1/service-orders/{}", order_id),
            Some(json!({ "notes": "late note" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({ "order_id": order_id, "service_id": oil.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/service-orders/{}", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_without_details_cannot_be_finalized() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "EMP-001").await;
    let order = open_order(&app, car.id, None).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("0 of 0"));
}

#[tokio::test]
async fn manual_status_change_cannot_finalize() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "MAN-001").await;
    let order = open_order(&app, car.id, None).await;
    let uri = format!("/api/v1/service-orders/{}/status", order["id"]);

    let (status, _) = app
        .call(&app.mechanic, Method::PATCH, &uri, Some(json!({ "status": "finalizada" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(&app.mechanic, Method::PATCH, &uri, Some(json!({ "status": "en progreso" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "en progreso");

    let (status, _) = app
        .call(&app.mechanic, Method::PATCH, &uri, Some(json!({ "status": "abierta" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no way back to abierta");
}

#[tokio::test]
async fn detail_status_cannot_move_backwards() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "DET-001").await;
    let service = app.create_catalog_service("Diagnóstico", dec!(400.00)).await;
    let order = open_order(&app, car.id, None).await;
    let detail = add_detail(&app, order["id"].as_i64().unwrap(), service.id, "400.00").await;

    let (status, _) = set_detail_status(&app, detail, "completado").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_detail_status(&app, detail, "pendiente").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = set_detail_status(&app, detail, "en_proceso").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detail_price_defaults_to_catalog_estimate() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "PRC-001").await;
    let service = app.create_catalog_service("Afinación", dec!(2400.00)).await;
    let order = open_order(&app, car.id, None).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({ "order_id": order["id"], "service_id": service.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(decimal(&body["data"]["price"]), dec!(2400.00));
    assert_eq!(body["data"]["status"], "pendiente");
}

#[tokio::test]
async fn order_for_someone_elses_vehicle_is_rejected() {
    let app = TestApp::new().await;
    let other = app.create_customer("otro@taller.test").await;
    let car = app.create_vehicle(other.id(), "OTR-001").await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/service-orders",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": car.id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("does not belong"));
}

#[tokio::test]
async fn appointment_stays_open_while_its_order_is() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "LNK-001").await;
    let wash = app.create_catalog_service("Lavado", dec!(150.00)).await;

    let (status, body) = app
        .call(
            &app.customer,
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": car.id,
                "date": "2026-11-20",
                "service_type": "Lavado"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let appointment_id = body["data"]["id"].as_i64().unwrap();
    let appointment_uri = format!("/api/v1/appointments/{}/status", appointment_id);

    let order = open_order(&app, car.id, Some(appointment_id)).await;
    let order_id = order["id"].as_i64().unwrap();

    for target in ["cancelada", "completada", "finalizada"] {
        let (status, body) = app
            .call(
                &app.admin,
                Method::PATCH,
                &appointment_uri,
                Some(json!({ "status": target })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{target}: {body}");
    }

    let detail = add_detail(&app, order_id, wash.id, "150.00").await;
    set_detail_status(&app, detail, "completado").await;
    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(
            &app.admin,
            Method::GET,
            &format!("/api/v1/appointments/{}", appointment_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["status"], "finalizada");

    let (status, body) = app
        .call(
            &app.admin,
            Method::PATCH,
            &appointment_uri,
            Some(json!({ "status": "completada" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn order_opens_with_inline_details_and_a_history_entry() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "INL-001").await;
    let oil = app.create_catalog_service("Cambio de aceite", dec!(650.00)).await;
    let filter = app.create_catalog_service("Filtro de aire", dec!(180.00)).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/service-orders",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": car.id,
                "mileage": 61_250,
                "notes": "cliente espera en sala",
                "details": [
                    { "service_id": oil.id, "mechanic_id": app.mechanic.id() },
                    { "service_id": filter.id, "price": "200.00", "work_hours": "0.5" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["mileage"], 61_250);
    assert_eq!(decimal(&body["data"]["total"]), dec!(850.00));

    let (_, body) = app
        .call(
            &app.mechanic,
            Method::GET,
            &format!("/api/v1/service-orders/{}/details", order_id),
            None,
        )
        .await;
    let details = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(details.len(), 2);

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::GET,
            &format!("/api/v1/vehicle-history/order/{}", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let entries = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["mileage"], 61_250);
    assert_eq!(entries[0]["service_type"], "Mantenimiento general");
    assert_eq!(entries[0]["description"], "cliente espera en sala");
    assert_eq!(entries[0]["mechanic_id"], app.mechanic.id());
    assert!(entries[0]["end_date"].is_null());

    for detail in &details {
        let (status, _) =
            set_detail_status(&app, detail["id"].as_i64().unwrap(), "completado").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/finalize", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(
            &app.mechanic,
            Method::GET,
            &format!("/api/v1/vehicle-history/order/{}", order_id),
            None,
        )
        .await;
    assert!(!body["data"][0]["end_date"].is_null(), "{body}");
}

#[tokio::test]
async fn inline_detail_with_unknown_service_rolls_back_the_order() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "RBK-001").await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/service-orders",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": car.id,
                "details": [{ "service_id": 9999 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, body) = app
        .call(
            &app.mechanic,
            Method::GET,
            &format!("/api/v1/service-orders/vehicle/{}", car.id),
            None,
        )
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn receipt_downloads_as_csv() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "RCP-001").await;
    let tires = app.create_catalog_service("Rotación de llantas", dec!(300.00)).await;
    let order = open_order(&app, car.id, None).await;
    let order_id = order["id"].as_i64().unwrap();
    add_detail(&app, order_id, tires.id, "320.00").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/service-orders/{}/receipt", order_id),
            None,
            Some(&app.mechanic.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let header_value = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    assert!(header_value(header::CONTENT_TYPE).starts_with("text/csv"));
    assert_eq!(
        header_value(header::CONTENT_DISPOSITION),
        format!("attachment; filename=\"service-order-{}-receipt.csv\"", order_id)
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "{csv}");
    assert!(lines[1].contains("Rotación de llantas"));
    assert!(lines[2].contains(",total,"));
    assert!(lines[2].ends_with("320.00"));

    let (status, _) = app
        .call(
            &app.customer,
            Method::GET,
            &format!("/api/v1/service-orders/{}/receipt", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn references_to_missing_records_are_rejected() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "REF-001").await;
    let service = app.create_catalog_service("Escaneo", dec!(350.00)).await;
    let order = open_order(&app, car.id, None).await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({ "order_id": order["id"], "service_id": 424242 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({ "order_id": 424242, "service_id": service.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .call(
            &app.customer,
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "customer_id": app.customer.id(),
                "vehicle_id": 424242,
                "date": "2026-12-01",
                "service_type": "Escaneo"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}
