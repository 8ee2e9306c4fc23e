//! Vehicles, their service history, the catalog and dashboard statistics.

mod common;

use axum::{
    body::to_bytes,
    http::{header, Method, StatusCode},
};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn plates_are_normalized_and_unique() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            &app.customer,
            Method::POST,
            "/api/v1/vehicles",
            Some(json!({
                "owner_id": app.customer.id(),
                "make": "Toyota",
                "model": "Corolla",
                "year": 2020,
                "plate": "  xyz-987 "
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["plate"], "XYZ-987");

    let (status, body) = app
        .call(&app.customer, Method::GET, "/api/v1/vehicles/plate/xyz-987", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["make"], "Toyota");

    let (status, _) = app
        .call(
            &app.admin,
            Method::POST,
            "/api/v1/vehicles",
            Some(json!({
                "owner_id": app.customer.id(),
                "make": "Honda",
                "model": "Civic",
                "year": 2018,
                "plate": "XYZ-987"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "duplicate plate");
}

#[tokio::test]
async fn vehicle_with_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let busy = app.create_vehicle(app.customer.id(), "BSY-001").await;
    let idle = app.create_vehicle(app.customer.id(), "IDL-001").await;

    app.state
        .services
        .service_orders
        .create(
            taller_api::services::service_orders::NewServiceOrder {
                customer_id: app.customer.id(),
                vehicle_id: busy.id,
                appointment_id: None,
                diagnosis: None,
                notes: None,
                ..Default::default()
            },
            app.admin.id(),
        )
        .await
        .expect("open order");

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/vehicles/{}", busy.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/vehicles/{}", idle.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn history_is_recorded_and_exported_as_csv() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "HIS-001").await;

    for (service_type, mileage, start) in [
        ("Cambio de aceite", 42_000, "2026-01-10T09:00:00Z"),
        ("Frenos", 48_500, "2026-06-02T15:30:00Z"),
    ] {
        let (status, body) = app
            .call(
                &app.mechanic,
                Method::POST,
                "/api/v1/vehicle-history",
                Some(json!({
                    "vehicle_id": car.id,
                    "mechanic_id": app.mechanic.id(),
                    "service_type": service_type,
                    "description": "routine work",
                    "mileage": mileage,
                    "start_date": start
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/vehicle-history/vehicle/{}/export", car.id),
            None,
            Some(&app.admin.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "header plus two records:\n{csv}");
    assert!(lines[0].starts_with("id,vehicle,order_id,mechanic_id,service_type"));
    assert!(lines[1].contains("Cambio de aceite"), "oldest first");
    assert!(lines[2].contains("Frenos"));
}

#[tokio::test]
async fn history_must_match_the_order_vehicle() {
    let app = TestApp::new().await;
    let first = app.create_vehicle(app.customer.id(), "MIX-001").await;
    let second = app.create_vehicle(app.customer.id(), "MIX-002").await;
    let order = app
        .state
        .services
        .service_orders
        .create(
            taller_api::services::service_orders::NewServiceOrder {
                customer_id: app.customer.id(),
                vehicle_id: first.id,
                appointment_id: None,
                diagnosis: None,
                notes: None,
                ..Default::default()
            },
            app.admin.id(),
        )
        .await
        .expect("open order");

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/vehicle-history",
            Some(json!({
                "vehicle_id": second.id,
                "order_id": order.id,
                "mechanic_id": app.mechanic.id(),
                "service_type": "Frenos",
                "description": "wrong car",
                "mileage": 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/vehicle-history",
            Some(json!({
                "vehicle_id": first.id,
                "order_id": order.id,
                "mechanic_id": app.customer.id(),
                "service_type": "Frenos",
                "description": "not a mechanic",
                "mileage": 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_service_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    let car = app.create_vehicle(app.customer.id(), "CAT-001").await;
    let used = app.create_catalog_service("Balanceo", dec!(300.00)).await;
    let unused = app.create_catalog_service("Lavado de motor", dec!(250.00)).await;

    let order = app
        .state
        .services
        .service_orders
        .create(
            taller_api::services::service_orders::NewServiceOrder {
                customer_id: app.customer.id(),
                vehicle_id: car.id,
                appointment_id: None,
                diagnosis: None,
                notes: None,
                ..Default::default()
            },
            app.admin.id(),
        )
        .await
        .unwrap();
    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/order-details",
            Some(json!({ "order_id": order.id, "service_id": used.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/services/{}", used.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            &app.admin,
            Method::DELETE,
            &format!("/api/v1/services/{}", unused.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn summary_counts_customers_and_low_stock() {
    let app = TestApp::new().await;
    app.create_customer("segundo@taller.test").await;
    app.create_item("STA-001", 1, 5).await;
    app.create_item("STA-002", 50, 5).await;

    let (status, body) = app
        .call(&app.admin, Method::GET, "/api/v1/statistics/summary", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total_customers"], 2);
    assert_eq!(body["data"]["low_stock_items"], 1);
    assert_eq!(body["data"]["completed_services_this_month"], 0);
    assert!(body["data"]["recent_services"]
        .as_array()
        .is_some_and(|r| r.is_empty()));
}

#[tokio::test]
async fn malformed_requests_use_the_error_shape() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/inventory/not-a-number",
            None,
            Some(&app.admin.token),
        )
        .await;
    let (status, body) = common::into_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({ "name": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["timestamp"].is_string(), "{body}");

    let (status, _) = app
        .call(&app.admin, Method::GET, "/api/v1/suppliers/424242", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for uri in [
        "/api/v1/inventory-movements/range",
        "/api/v1/inventory-movements/range?from=yesterday&to=today",
        "/api/v1/suppliers?page=first",
        "/api/v1/vehicle-history/range?from=2026-01-01T00:00:00Z",
    ] {
        let (status, body) = app.call(&app.admin, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}: {body}");
        assert!(body["message"].is_string(), "{uri}: {body}");
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "admin@taller.test" })),
            None,
        )
        .await;
    let (status, body) = common::into_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn tools_are_tracked_by_the_shop() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/tools",
            Some(json!({ "name": "Gato hidráulico", "tool_type": "elevación", "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "disponible");
    let uri = format!("/api/v1/tools/{}", body["data"]["id"]);

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PUT,
            &uri,
            Some(json!({
                "name": "Gato hidráulico",
                "status": "prestada",
                "quantity": 2,
                "checkout_date": "2026-10-01",
                "return_date": "2026-09-30"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .call(
            &app.mechanic,
            Method::PUT,
            &uri,
            Some(json!({
                "name": "Gato hidráulico",
                "status": "prestada",
                "quantity": 2,
                "checkout_date": "2026-10-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "prestada");
    assert!(body["data"]["tool_type"].is_null(), "replaced: {body}");

    let (status, _) = app.call(&app.customer, Method::GET, "/api/v1/tools", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(&app.mechanic, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(&app.admin, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(&app.admin, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
