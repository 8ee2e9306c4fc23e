#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use taller_api::{
    config::AppConfig,
    db,
    entities::{catalog_service, inventory_item, role, supplier, user, vehicle},
    events::{self, EventSender},
    notifications::MemoryNotifier,
    services::{
        catalog::CatalogServiceInput,
        inventory::NewInventoryItem,
        suppliers::SupplierInput,
        users::NewUser,
        vehicles::VehicleInput,
    },
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str =
    "test-secret-key-for-integration-tests-only-0123456789abcdef0123456789abcdef";

/// One signed-in user of the test application.
pub struct Account {
    pub user: user::Model,
    pub token: String,
}

impl Account {
    pub fn id(&self) -> i32 {
        self.user.id
    }
}

/// Full application over a fresh SQLite file, with one account per role.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub notifier: Arc<MemoryNotifier>,
    pub admin: Account,
    pub mechanic: Account,
    pub customer: Account,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir");
        let db_path = db_dir.path().join("taller_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let pool = Arc::new(pool);

        let notifier = Arc::new(MemoryNotifier::default());
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx, notifier.clone()));
        let event_sender = Arc::new(EventSender::new(event_tx));

        let state = AppState::new(pool, cfg, event_sender);
        let router = taller_api::build_router(state.clone()).expect("router builds");

        let admin = create_account(&state, role::ADMINISTRATOR, "admin@taller.test").await;
        let mechanic = create_account(&state, role::MECHANIC, "mecanico@taller.test").await;
        let customer = create_account(&state, role::CUSTOMER, "cliente@taller.test").await;

        Self {
            router,
            state,
            notifier,
            admin,
            mechanic,
            customer,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request as `account` and decode the JSON body.
    pub async fn call(
        &self,
        account: &Account,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self
            .request(method, uri, body, Some(&account.token))
            .await;
        into_json(response).await
    }

    pub async fn create_customer(&self, email: &str) -> Account {
        create_account(&self.state, role::CUSTOMER, email).await
    }

    pub async fn create_item(&self, code: &str, stock: i32, minimum: i32) -> inventory_item::Model {
        self.state
            .services
            .inventory
            .create_item(NewInventoryItem {
                code: code.to_string(),
                name: format!("Part {}", code),
                description: None,
                category: Some("Frenos".to_string()),
                subcategory: None,
                brand: None,
                model: None,
                stock_quantity: stock,
                stock_minimum: Some(minimum),
                stock_maximum: None,
                unit_of_measure: None,
                location: None,
                purchase_price: Decimal::new(8000, 2),
                sale_price: Decimal::new(12000, 2),
            })
            .await
            .expect("seed inventory item")
    }

    pub async fn create_vehicle(&self, owner_id: i32, plate: &str) -> vehicle::Model {
        self.state
            .services
            .vehicles
            .create(VehicleInput {
                owner_id: Some(owner_id),
                make: Some("Nissan".to_string()),
                model: Some("Versa".to_string()),
                year: Some(2019),
                plate: Some(plate.to_string()),
                ..Default::default()
            })
            .await
            .expect("seed vehicle")
    }

    pub async fn create_supplier(&self, name: &str) -> supplier::Model {
        self.state
            .services
            .suppliers
            .create(SupplierInput {
                name: Some(name.to_string()),
                ..Default::default()
            })
            .await
            .expect("seed supplier")
    }

    pub async fn create_catalog_service(&self, name: &str, price: Decimal) -> catalog_service::Model {
        self.state
            .services
            .catalog
            .create(CatalogServiceInput {
                name: Some(name.to_string()),
                category: Some("Mantenimiento".to_string()),
                estimated_price: Some(price),
                estimated_duration_minutes: Some(60),
                ..Default::default()
            })
            .await
            .expect("seed catalog service")
    }

    pub async fn stock_of(&self, item_id: i32) -> i32 {
        self.state
            .services
            .inventory
            .require_item(item_id)
            .await
            .expect("item exists")
            .stock_quantity
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn create_account(state: &AppState, role_name: &str, email: &str) -> Account {
    let role = state
        .services
        .roles
        .by_name(role_name)
        .await
        .expect("role lookup")
        .expect("roles are seeded by migrations");

    let user = state
        .services
        .users
        .create(NewUser {
            role_id: role.id,
            first_name: "Test".to_string(),
            last_name: role_name.to_string(),
            second_last_name: None,
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            phone: None,
            address: None,
            city: None,
            state_province: None,
            postal_code: None,
            birth_date: None,
        })
        .await
        .expect("seed user");

    let token = state
        .auth
        .generate_token(&user, role_name)
        .expect("token for seeded user");

    Account { user, token }
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}
