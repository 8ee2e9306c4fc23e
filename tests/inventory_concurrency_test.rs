mod common;

use common::TestApp;
use taller_api::{
    entities::stock_movement::MovementType,
    errors::ServiceError,
    services::inventory::StockAdjustment,
};

fn salida(item_id: i32, user_id: i32, quantity: i32) -> StockAdjustment {
    StockAdjustment {
        item_id,
        quantity,
        movement_type: MovementType::Salida,
        user_id,
        motive: "concurrent withdrawal".to_string(),
        order_id: None,
        supplier_id: None,
        invoice_number: None,
        notes: None,
    }
}

#[tokio::test]
async fn concurrent_salidas_never_overdraw_stock() {
    let app = TestApp::new().await;
    let item = app.create_item("CONC-001", 10, 0).await;
    let item_id = item.id;
    let user_id = app.mechanic.id();

    let mut tasks = vec![];
    for _ in 0..20 {
        let svc = app.state.services.inventory.clone();
        tasks.push(tokio::spawn(async move {
            svc.adjust_stock(salida(item_id, user_id, 1)).await
        }));
    }

    let mut success = 0;
    let mut rejected = 0;
    for t in tasks {
        match t.await.expect("task panicked") {
            Ok(_) => success += 1,
            Err(ServiceError::InsufficientStock(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(success, 10, "exactly 10 withdrawals should succeed; got {}", success);
    assert_eq!(rejected, 10);
    assert_eq!(app.stock_of(item.id).await, 0);

    let movements = app
        .state
        .services
        .stock_movements
        .by_item(item.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 10);
}

#[tokio::test]
async fn mixed_concurrent_movements_sum_to_the_ledger() {
    let app = TestApp::new().await;
    let item = app.create_item("CONC-002", 5, 0).await;
    let user_id = app.mechanic.id();

    let mut tasks = vec![];
    for i in 0..12 {
        let svc = app.state.services.inventory.clone();
        let adjustment = if i % 3 == 0 {
            StockAdjustment {
                movement_type: MovementType::Entrada,
                ..salida(item.id, user_id, 2)
            }
        } else {
            salida(item.id, user_id, 1)
        };
        tasks.push(tokio::spawn(async move { svc.adjust_stock(adjustment).await }));
    }
    for t in tasks {
        let _ = t.await.expect("task panicked");
    }

    let movements = app
        .state
        .services
        .stock_movements
        .by_item(item.id)
        .await
        .unwrap();
    let net: i32 = movements
        .iter()
        .map(|m| m.movement_type.signed(m.quantity))
        .sum();

    let stock = app.stock_of(item.id).await;
    assert!(stock >= 0);
    assert_eq!(stock, 5 + net, "stock must equal opening stock plus the ledger");
}

#[tokio::test]
async fn two_full_withdrawals_race_for_the_same_stock() {
    let app = TestApp::new().await;
    let item = app.create_item("CONC-FULL", 7, 0).await;
    let user_id = app.mechanic.id();

    let first = app.state.services.inventory.clone();
    let second = app.state.services.inventory.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.adjust_stock(salida(item.id, user_id, 7)).await }),
        tokio::spawn(async move { second.adjust_stock(salida(item.id, user_id, 7)).await }),
    );

    let outcomes = [a.expect("task panicked"), b.expect("task panicked")];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::InsufficientStock(_))))
            .count(),
        1
    );
    assert_eq!(app.stock_of(item.id).await, 0);
    assert_eq!(app.state.services.inventory.locks().tracked(), 0);
}
