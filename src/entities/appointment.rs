use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AppointmentStatus {
    #[sea_orm(string_value = "programada")]
    Programada,
    #[sea_orm(string_value = "en_proceso")]
    EnProceso,
    #[sea_orm(string_value = "finalizada")]
    Finalizada,
    #[sea_orm(string_value = "completada")]
    Completada,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
}

impl AppointmentStatus {
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Programada, EnProceso)
                | (Programada, Cancelada)
                | (EnProceso, Finalizada)
                | (EnProceso, Completada)
                | (EnProceso, Cancelada)
                | (Finalizada, Completada)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completada | AppointmentStatus::Cancelada
        )
    }

    pub fn ensure_transition(self, next: AppointmentStatus) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition(format!(
                "appointment cannot move from '{}' to '{}'",
                self, next
            )))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub date: NaiveDate,
    pub status: AppointmentStatus,
    pub service_type: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Vehicle,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus::*;
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(Programada, EnProceso, true)]
    #[case(Programada, Cancelada, true)]
    #[case(Programada, Finalizada, false)]
    #[case(EnProceso, Finalizada, true)]
    #[case(EnProceso, Completada, true)]
    #[case(Finalizada, Completada, true)]
    #[case(Finalizada, Cancelada, false)]
    #[case(Cancelada, Programada, false)]
    #[case(Completada, EnProceso, false)]
    fn transitions(
        #[case] from: AppointmentStatus,
        #[case] to: AppointmentStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn rejected_transition_is_typed() {
        assert_matches!(
            Cancelada.ensure_transition(EnProceso),
            Err(ServiceError::InvalidTransition(_))
        );
    }
}
