//! sea-orm entities, one module per table.

pub mod appointment;
pub mod catalog_service;
pub mod inventory_item;
pub mod order_detail;
pub mod purchase_order;
pub mod purchase_order_detail;
pub mod role;
pub mod service_order;
pub mod stock_movement;
pub mod supplier;
pub mod tool;
pub mod user;
pub mod vehicle;
pub mod vehicle_history;
