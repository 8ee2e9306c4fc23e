use chrono::{DateTime, Datelike, Days, Months, NaiveTime, TimeZone, Utc};
use sea_orm::{
    sea_query::Expr,
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{
        catalog_service, inventory_item, order_detail, role,
        service_order::{self, ServiceOrderStatus},
        user,
    },
    errors::ServiceError,
};

pub const POPULAR_SERVICES_LIMIT: u64 = 5;
pub const RECENT_SERVICES_LIMIT: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult, ToSchema)]
pub struct PopularService {
    pub service_id: i32,
    pub name: String,
    pub requests: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentService {
    pub order_id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub status: ServiceOrderStatus,
    pub start_date: DateTime<Utc>,
    #[schema(value_type = String)]
    pub total: rust_decimal::Decimal,
}

impl From<service_order::Model> for RecentService {
    fn from(order: service_order::Model) -> Self {
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            vehicle_id: order.vehicle_id,
            status: order.status,
            start_date: order.start_date,
            total: order.total,
        }
    }
}

/// Dashboard figures for the current calendar month.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatisticsSummary {
    pub total_customers: u64,
    pub completed_services_this_month: u64,
    pub popular_services: Vec<PopularService>,
    pub recent_services: Vec<RecentService>,
    pub low_stock_items: u64,
}

/// First instant of the month containing `now` and of the month after it.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first = today - Days::new(u64::from(today.day0()));
    let next = first.checked_add_months(Months::new(1)).unwrap_or(first);

    (
        Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN)),
    )
}

#[derive(Clone)]
pub struct StatisticsService {
    db_pool: Arc<DbPool>,
}

impl StatisticsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Users holding the customer role.
    pub async fn total_customers(&self) -> Result<u64, ServiceError> {
        Ok(user::Entity::find()
            .join(JoinType::InnerJoin, user::Relation::Role.def())
            .filter(role::Column::Name.eq(role::CUSTOMER))
            .count(&*self.db_pool)
            .await?)
    }

    /// Orders finalized during the current month.
    pub async fn completed_services_this_month(&self) -> Result<u64, ServiceError> {
        let (start, end) = month_bounds(Utc::now());
        Ok(service_order::Entity::find()
            .filter(service_order::Column::Status.eq(ServiceOrderStatus::Finalizada))
            .filter(service_order::Column::EndDate.gte(start))
            .filter(service_order::Column::EndDate.lt(end))
            .count(&*self.db_pool)
            .await?)
    }

    /// Catalog services most often added to orders opened this month.
    #[instrument(skip(self))]
    pub async fn popular_services(&self, limit: u64) -> Result<Vec<PopularService>, ServiceError> {
        let (start, end) = month_bounds(Utc::now());
        Ok(order_detail::Entity::find()
            .select_only()
            .column_as(order_detail::Column::ServiceId, "service_id")
            .column_as(catalog_service::Column::Name, "name")
            .column_as(Expr::col(order_detail::Column::Id).count(), "requests")
            .join(JoinType::InnerJoin, order_detail::Relation::Order.def())
            .join(JoinType::InnerJoin, order_detail::Relation::Service.def())
            .filter(service_order::Column::StartDate.gte(start))
            .filter(service_order::Column::StartDate.lt(end))
            .group_by(order_detail::Column::ServiceId)
            .group_by(catalog_service::Column::Name)
            .order_by(Expr::col(order_detail::Column::Id).count(), Order::Desc)
            .order_by_asc(catalog_service::Column::Name)
            .limit(limit)
            .into_model::<PopularService>()
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn recent_services(&self, limit: u64) -> Result<Vec<RecentService>, ServiceError> {
        Ok(service_order::Entity::find()
            .order_by_desc(service_order::Column::StartDate)
            .order_by_desc(service_order::Column::Id)
            .limit(limit)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(RecentService::from)
            .collect())
    }

    pub async fn low_stock_items(&self) -> Result<u64, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(
                Expr::col(inventory_item::Column::StockQuantity)
                    .lte(Expr::col(inventory_item::Column::StockMinimum)),
            )
            .count(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<StatisticsSummary, ServiceError> {
        let (total_customers, completed, popular, recent, low_stock) = tokio::try_join!(
            self.total_customers(),
            self.completed_services_this_month(),
            self.popular_services(POPULAR_SERVICES_LIMIT),
            self.recent_services(RECENT_SERVICES_LIMIT),
            self.low_stock_items(),
        )?;

        Ok(StatisticsSummary {
            total_customers,
            completed_services_this_month: completed,
            popular_services: popular,
            recent_services: recent,
            low_stock_items: low_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2026, 3, 15, (2026, 3), (2026, 4))]
    #[case(2026, 12, 31, (2026, 12), (2027, 1))]
    #[case(2026, 1, 1, (2026, 1), (2026, 2))]
    fn month_bounds_cover_the_calendar_month(
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
        #[case] start: (i32, u32),
        #[case] end: (i32, u32),
    ) {
        let now = Utc.with_ymd_and_hms(y, m, d, 13, 30, 0).unwrap();
        let (from, to) = month_bounds(now);
        assert_eq!(from, Utc.with_ymd_and_hms(start.0, start.1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(end.0, end.1, 1, 0, 0, 0).unwrap());
        assert!(from <= now && now < to);
    }
}
