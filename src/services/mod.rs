//! Business logic, one service per resource. Handlers call into these; nothing
//! here knows about HTTP.

use sea_orm::{EntityTrait, FromQueryResult, PaginatorTrait, Select};

use crate::db::DbPool;
use crate::errors::ServiceError;

// Stock
pub mod inventory;
pub mod purchase_order_details;
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
pub mod roles;
pub mod users;
pub mod vehicles;

// Reporting
pub mod statistics;

/// Runs `query` one page at a time. `page` is 1-based.
pub(crate) async fn fetch_page<'db, E, M>(
    db: &'db DbPool,
    query: Select<E>,
    page: u64,
    limit: u64,
) -> Result<(Vec<M>, u64), ServiceError>
where
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync + 'db,
{
    let paginator = query.paginate(db, limit.max(1));
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((items, total))
}
