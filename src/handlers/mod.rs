//! HTTP handlers, one module per resource. Each module exposes `routes()`
//! with full paths; `crate::api_v1_routes` merges them under `/api/v1`.

pub mod common;
pub mod health;

// Stock
pub mod inventory;
pub mod purchase_orders;
pub mod stock_movements;
pub mod suppliers;
pub mod tools;

// Workshop flow
pub mod appointments;
pub mod order_details;
pub mod service_orders;
pub mod vehicle_history;

// Reference data
pub mod catalog;
pub mod users;
pub mod vehicles;

pub mod statistics;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    appointments::AppointmentService, catalog::CatalogService, inventory::InventoryService,
    order_details::OrderDetailService, purchase_order_details::PurchaseOrderDetailService,
    purchase_orders::PurchaseOrderService, roles::RoleService, service_orders::ServiceOrderService,
    statistics::StatisticsService, stock_movements::StockMovementService,
    suppliers::SupplierService, tools::ToolService, users::UserService,
    vehicle_history::VehicleHistoryService, vehicles::VehicleService,
};

pub use crate::AppState;

/// Services layer shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub stock_movements: Arc<StockMovementService>,
    pub service_orders: Arc<ServiceOrderService>,
    pub order_details: Arc<OrderDetailService>,
    pub appointments: Arc<AppointmentService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub purchase_order_details: Arc<PurchaseOrderDetailService>,
    pub suppliers: Arc<SupplierService>,
    pub tools: Arc<ToolService>,
    pub catalog: Arc<CatalogService>,
    pub roles: Arc<RoleService>,
    pub users: Arc<UserService>,
    pub vehicles: Arc<VehicleService>,
    pub vehicle_history: Arc<VehicleHistoryService>,
    pub statistics: Arc<StatisticsService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        // Receipts must share the inventory service so they take the same item locks.
        let inventory = Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone()));

        Self {
            stock_movements: Arc::new(StockMovementService::new(db_pool.clone())),
            service_orders: Arc::new(ServiceOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            order_details: Arc::new(OrderDetailService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            appointments: Arc::new(AppointmentService::new(db_pool.clone())),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender,
                inventory.clone(),
            )),
            purchase_order_details: Arc::new(PurchaseOrderDetailService::new(db_pool.clone())),
            suppliers: Arc::new(SupplierService::new(db_pool.clone())),
            tools: Arc::new(ToolService::new(db_pool.clone())),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            roles: Arc::new(RoleService::new(db_pool.clone())),
            users: Arc::new(UserService::new(db_pool.clone())),
            vehicles: Arc::new(VehicleService::new(db_pool.clone())),
            vehicle_history: Arc::new(VehicleHistoryService::new(db_pool.clone())),
            statistics: Arc::new(StatisticsService::new(db_pool)),
            inventory,
        }
    }
}
