use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taller API",
        version = "1.0.0",
        description = r#"
# Taller API

Backend for a vehicle repair workshop: customers and their vehicles, appointments,
service orders with their work lines, the parts inventory and its stock ledger,
suppliers and purchase orders.

## Authentication

Obtain a token from `POST /api/v1/auth/login` and send it on every other call:

```
Authorization: Bearer <your-jwt-token>
```

Roles are `administrador`, `mecanico` and `cliente`. Each endpoint lists the roles it admits.

## Errors

Failures share one body shape:

```json
{
  "error": "Bad Request",
  "message": "Insufficient stock for item 7: requested 5, available 2",
  "request_id": "3f1c...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (1-based) and `limit`; the server caps `limit`.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and token issuance"),
        (name = "inventory", description = "Parts inventory"),
        (name = "inventory-movements", description = "Stock ledger"),
        (name = "suppliers", description = "Part suppliers"),
        (name = "tools", description = "Workshop tool inventory"),
        (name = "purchase-orders", description = "Purchase orders and their receipt"),
        (name = "purchase-order-details", description = "Purchase order lines"),
        (name = "service-orders", description = "Repair orders"),
        (name = "order-details", description = "Work lines of a repair order"),
        (name = "appointments", description = "Workshop appointments"),
        (name = "vehicle-history", description = "Service history per vehicle"),
        (name = "services", description = "Catalog of workshop services"),
        (name = "vehicles", description = "Customer vehicles"),
        (name = "users", description = "Users and roles"),
        (name = "statistics", description = "Dashboard figures"),
        (name = "health", description = "Health and status checks")
    ),
    paths(
        crate::auth::login_handler,

        handlers::health::api_status,
        handlers::health::health_check,

        handlers::inventory::list_items,
        handlers::inventory::get_item,
        handlers::inventory::get_item_by_code,
        handlers::inventory::search_items,
        handlers::inventory::items_by_category,
        handlers::inventory::low_stock_items,
        handlers::inventory::item_movements,
        handlers::inventory::create_item,
        handlers::inventory::update_item,
        handlers::inventory::adjust_item_stock,
        handlers::inventory::delete_item,

        handlers::stock_movements::list_movements,
        handlers::stock_movements::get_movement,
        handlers::stock_movements::movements_by_item,
        handlers::stock_movements::movements_by_type,
        handlers::stock_movements::movements_by_order,
        handlers::stock_movements::movements_by_supplier,
        handlers::stock_movements::movements_by_user,
        handlers::stock_movements::movements_in_range,
        handlers::stock_movements::create_movement,
        handlers::stock_movements::update_movement_notes,

        handlers::suppliers::list_suppliers,
        handlers::suppliers::get_supplier,
        handlers::suppliers::search_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::delete_supplier,

        handlers::tools::list_tools,
        handlers::tools::get_tool,
        handlers::tools::create_tool,
        handlers::tools::update_tool,
        handlers::tools::delete_tool,

        handlers::purchase_orders::list_purchase_orders,
        handlers::purchase_orders::get_purchase_order,
        handlers::purchase_orders::purchase_orders_by_supplier,
        handlers::purchase_orders::purchase_orders_by_user,
        handlers::purchase_orders::purchase_order_lines,
        handlers::purchase_orders::create_purchase_order,
        handlers::purchase_orders::update_purchase_order,
        handlers::purchase_orders::receive_purchase_order,
        handlers::purchase_orders::delete_purchase_order,
        handlers::purchase_orders::get_line,
        handlers::purchase_orders::lines_by_order,
        handlers::purchase_orders::lines_by_item,
        handlers::purchase_orders::lines_by_status,
        handlers::purchase_orders::create_line,
        handlers::purchase_orders::update_line,
        handlers::purchase_orders::update_received_quantity,
        handlers::purchase_orders::delete_line,

        handlers::service_orders::list_orders,
        handlers::service_orders::get_order,
        handlers::service_orders::orders_by_customer,
        handlers::service_orders::orders_by_vehicle,
        handlers::service_orders::orders_by_status,
        handlers::service_orders::order_details,
        handlers::service_orders::order_receipt,
        handlers::service_orders::create_order,
        handlers::service_orders::update_order,
        handlers::service_orders::update_order_status,
        handlers::service_orders::finalize_order,
        handlers::service_orders::delete_order,

        handlers::order_details::list_details,
        handlers::order_details::get_detail,
        handlers::order_details::details_by_order,
        handlers::order_details::details_by_mechanic,
        handlers::order_details::details_by_status,
        handlers::order_details::create_detail,
        handlers::order_details::update_detail,
        handlers::order_details::update_detail_status,
        handlers::order_details::assign_mechanic,
        handlers::order_details::delete_detail,

        handlers::appointments::list_appointments,
        handlers::appointments::get_appointment,
        handlers::appointments::appointments_by_customer,
        handlers::appointments::appointments_by_vehicle,
        handlers::appointments::appointments_by_date,
        handlers::appointments::appointments_by_status,
        handlers::appointments::create_appointment,
        handlers::appointments::update_appointment,
        handlers::appointments::update_appointment_status,
        handlers::appointments::delete_appointment,

        handlers::vehicle_history::list_history,
        handlers::vehicle_history::get_history,
        handlers::vehicle_history::history_by_vehicle,
        handlers::vehicle_history::export_history,
        handlers::vehicle_history::history_by_order,
        handlers::vehicle_history::history_by_mechanic,
        handlers::vehicle_history::history_in_range,
        handlers::vehicle_history::create_history,
        handlers::vehicle_history::update_history,
        handlers::vehicle_history::delete_history,

        handlers::catalog::list_services,
        handlers::catalog::get_service,
        handlers::catalog::services_by_category,
        handlers::catalog::create_service,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,

        handlers::vehicles::list_vehicles,
        handlers::vehicles::get_vehicle,
        handlers::vehicles::vehicle_by_plate,
        handlers::vehicles::vehicles_by_owner,
        handlers::vehicles::create_vehicle,
        handlers::vehicles::update_vehicle,
        handlers::vehicles::delete_vehicle,

        handlers::users::list_roles,
        handlers::users::get_role,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::users_by_role,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        handlers::statistics::summary,
        handlers::statistics::total_customers,
        handlers::statistics::completed_services,
        handlers::statistics::popular_services,
        handlers::statistics::recent_services,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,

            crate::auth::LoginRequest,
            crate::auth::LoginResponse,
            crate::auth::UserProfile,

            crate::entities::appointment::AppointmentStatus,
            crate::entities::order_detail::OrderDetailStatus,
            crate::entities::purchase_order::PurchaseOrderStatus,
            crate::entities::purchase_order_detail::PurchaseOrderDetailStatus,
            crate::entities::service_order::ServiceOrderStatus,
            crate::entities::stock_movement::MovementType,

            crate::services::inventory::NewInventoryItem,
            crate::services::inventory::InventoryItemChanges,
            crate::services::stock_movements::MovementNoteChanges,
            crate::services::suppliers::SupplierInput,
            crate::services::tools::ToolInput,
            crate::services::purchase_orders::NewPurchaseOrder,
            crate::services::purchase_orders::NewPurchaseOrderLine,
            crate::services::purchase_orders::PurchaseOrderChanges,
            crate::services::purchase_order_details::NewPurchaseOrderDetail,
            crate::services::purchase_order_details::PurchaseOrderDetailChanges,
            crate::services::service_orders::NewServiceOrder,
            crate::services::order_details::NewOrderLine,
            crate::services::purchase_orders::ReceivePurchaseOrder,
            crate::services::service_orders::ServiceOrderChanges,
            crate::services::order_details::NewOrderDetail,
            crate::services::order_details::OrderDetailChanges,
            crate::services::appointments::NewAppointment,
            crate::services::appointments::AppointmentChanges,
            crate::services::vehicle_history::NewVehicleHistory,
            crate::services::vehicle_history::VehicleHistoryChanges,
            crate::services::catalog::CatalogServiceInput,
            crate::services::vehicles::VehicleInput,
            crate::services::users::NewUser,
            crate::services::users::UserChanges,
            crate::services::statistics::PopularService,
            crate::services::statistics::RecentService,
            crate::services::statistics::StatisticsSummary,

            handlers::inventory::StockChangeRequest,
            handlers::stock_movements::NewMovementRequest,
            handlers::service_orders::ServiceOrderStatusRequest,
            handlers::order_details::OrderDetailStatusRequest,
            handlers::order_details::AssignMechanicRequest,
            handlers::appointments::AppointmentStatusRequest,
            handlers::purchase_orders::ReceivedQuantityRequest,
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url(OPENAPI_JSON_PATH, ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from(OPENAPI_JSON_PATH).try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_workshop_paths_and_bearer_scheme() {
        let json = ApiDocV1::openapi().to_pretty_json().unwrap();
        assert!(json.contains("Taller API"));
        assert!(json.contains("/api/v1/purchase-orders/{id}/receive"));
        assert!(json.contains("/api/v1/service-orders/{id}/receipt"));
        assert!(json.contains("/api/v1/inventory/{id}/stock"));
        assert!(json.contains("bearer_auth"));
    }
}
