//! Seed data script: an administrator account plus a starter catalog, supplier
//! and parts inventory.
//!
//! Run with: cargo run --bin seed-data
//!
//! Safe to rerun; records that already exist (same email, code or name) are skipped.

use std::sync::Arc;

use anyhow::Context;
use rust_decimal_macros::dec;
use tracing::info;

use taller_api::{
    config, db,
    entities::role,
    errors::ServiceError,
    services::{
        catalog::{CatalogService, CatalogServiceInput},
        inventory::NewInventoryItem,
        roles::RoleService,
        suppliers::{SupplierInput, SupplierService},
        users::{NewUser, UserService},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;
    let pool = Arc::new(pool);

    let (tx, _rx) = tokio::sync::mpsc::channel(16);
    let state = AppState::new(
        pool.clone(),
        cfg,
        Arc::new(taller_api::events::EventSender::new(tx)),
    );

    seed_admin(&RoleService::new(pool.clone()), &UserService::new(pool.clone())).await?;
    let services = seed_catalog(&CatalogService::new(pool.clone())).await?;
    info!(created = services, "catalog services seeded");
    seed_supplier(&SupplierService::new(pool.clone())).await?;
    let items = seed_inventory(&state).await?;
    info!(created = items, "inventory items seeded");

    info!("seed complete; explore at http://localhost:8080/swagger-ui");
    Ok(())
}

async fn seed_admin(roles: &RoleService, users: &UserService) -> anyhow::Result<()> {
    let email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@taller.local".to_string());
    if users.by_email(&email).await?.is_some() {
        info!(%email, "administrator already present");
        return Ok(());
    }

    let password = std::env::var("SEED_ADMIN_PASSWORD")
        .context("SEED_ADMIN_PASSWORD must be set to create the administrator")?;
    let admin_role = roles
        .by_name(role::ADMINISTRATOR)
        .await?
        .context("roles table is not seeded; run the migrations first")?;

    users
        .create(NewUser {
            role_id: admin_role.id,
            first_name: "Admin".to_string(),
            last_name: "Taller".to_string(),
            second_last_name: None,
            email: email.clone(),
            password,
            phone: None,
            address: None,
            city: None,
            state_province: None,
            postal_code: None,
            birth_date: None,
        })
        .await?;
    info!(%email, "administrator created");
    Ok(())
}

async fn seed_catalog(catalog: &CatalogService) -> Result<usize, ServiceError> {
    let entries = [
        ("Cambio de aceite", "Mantenimiento", dec!(650.00), 45),
        ("Afinación mayor", "Mantenimiento", dec!(2400.00), 180),
        ("Alineación y balanceo", "Suspensión", dec!(550.00), 60),
        ("Cambio de balatas", "Frenos", dec!(900.00), 90),
        ("Diagnóstico por computadora", "Diagnóstico", dec!(400.00), 30),
    ];

    let existing = catalog.list(1, 100).await?.0;
    let mut created = 0;
    for (name, category, price, minutes) in entries {
        if existing.iter().any(|s| s.name == name) {
            continue;
        }
        catalog
            .create(CatalogServiceInput {
                name: Some(name.to_string()),
                description: None,
                category: Some(category.to_string()),
                estimated_price: Some(price),
                estimated_duration_minutes: Some(minutes),
            })
            .await?;
        created += 1;
    }
    Ok(created)
}

async fn seed_supplier(suppliers: &SupplierService) -> Result<(), ServiceError> {
    if !suppliers.search("Refaccionaria Central").await?.is_empty() {
        return Ok(());
    }
    suppliers
        .create(SupplierInput {
            name: Some("Refaccionaria Central".to_string()),
            contact: Some("Mostrador".to_string()),
            phone: Some("555-0100".to_string()),
            email: Some("ventas@refaccionaria.example".to_string()),
            city: Some("Monterrey".to_string()),
            ..Default::default()
        })
        .await?;
    info!("supplier seeded");
    Ok(())
}

async fn seed_inventory(state: &AppState) -> Result<usize, ServiceError> {
    let parts = [
        ("ACE-5W30", "Aceite sintético 5W-30 (litro)", "Lubricantes", 40, 10, dec!(95.00), dec!(160.00)),
        ("FIL-ACE-01", "Filtro de aceite", "Filtros", 25, 5, dec!(70.00), dec!(130.00)),
        ("BAL-DEL-01", "Juego de balatas delanteras", "Frenos", 8, 4, dec!(420.00), dec!(690.00)),
        ("BUJ-IRI-01", "Bujía de iridio", "Encendido", 32, 8, dec!(110.00), dec!(185.00)),
    ];

    let inventory = &state.services.inventory;
    let mut created = 0;
    for (code, name, category, stock, minimum, cost, price) in parts {
        if inventory.get_by_code(code).await?.is_some() {
            continue;
        }
        inventory
            .create_item(NewInventoryItem {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                category: Some(category.to_string()),
                subcategory: None,
                brand: None,
                model: None,
                stock_quantity: stock,
                stock_minimum: Some(minimum),
                stock_maximum: None,
                unit_of_measure: Some("pieza".to_string()),
                location: None,
                purchase_price: cost,
                sale_price: price,
            })
            .await?;
        created += 1;
    }
    Ok(created)
}
