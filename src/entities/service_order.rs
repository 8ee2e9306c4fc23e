use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Lifecycle of a workshop job: `abierta -> en progreso -> finalizada`.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ServiceOrderStatus {
    #[sea_orm(string_value = "abierta")]
    #[serde(rename = "abierta")]
    #[strum(serialize = "abierta")]
    Abierta,
    #[sea_orm(string_value = "en progreso")]
    #[serde(rename = "en progreso", alias = "en_progreso")]
    #[strum(serialize = "en progreso")]
    EnProgreso,
    #[sea_orm(string_value = "finalizada")]
    #[serde(rename = "finalizada")]
    #[strum(serialize = "finalizada")]
    Finalizada,
}

impl ServiceOrderStatus {
    pub fn can_transition_to(self, next: ServiceOrderStatus) -> bool {
        use ServiceOrderStatus::*;
        matches!(
            (self, next),
            (Abierta, EnProgreso) | (Abierta, Finalizada) | (EnProgreso, Finalizada)
        )
    }

    pub fn ensure_transition(self, next: ServiceOrderStatus) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition(format!(
                "service order cannot move from '{}' to '{}'",
                self, next
            )))
        }
    }

    pub fn is_finalized(self) -> bool {
        self == ServiceOrderStatus::Finalizada
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub appointment_id: Option<i32>,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub start_date: DateTimeUtc,
    pub end_date: Option<DateTimeUtc>,
    pub status: ServiceOrderStatus,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    /// Odometer reading when the vehicle came in.
    pub mileage: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub created_by: i32,
    pub finalized_by: Option<i32>,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Rejects any mutation of a finalized order's lines.
    pub fn ensure_editable(&self) -> Result<(), ServiceError> {
        if self.status.is_finalized() {
            Err(ServiceError::BusinessRuleViolation(format!(
                "service order {} is finalized and cannot be modified",
                self.id
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_detail::Entity")]
    Details,
    #[sea_orm(
        belongs_to = "super::appointment::Entity",
        from = "Column::AppointmentId",
        to = "super::appointment::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Appointment,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Vehicle,
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ServiceOrderStatus::*;
    use super::*;

    #[test]
    fn forward_transitions_only() {
        assert!(Abierta.can_transition_to(EnProgreso));
        assert!(EnProgreso.can_transition_to(Finalizada));
        assert!(!EnProgreso.can_transition_to(Abierta));
        assert!(!Finalizada.can_transition_to(Finalizada));
        assert!(!Finalizada.can_transition_to(EnProgreso));
    }

    #[test]
    fn serializes_with_space() {
        assert_eq!(serde_json::to_string(&EnProgreso).unwrap(), "\"en progreso\"");
        let parsed: ServiceOrderStatus = serde_json::from_str("\"en_progreso\"").unwrap();
        assert_eq!(parsed, EnProgreso);
    }
}
