use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::{appointment::AppointmentStatus, role},
    errors::{ApiError, ErrorResponse, ServiceError},
    services::appointments::{AppointmentChanges, NewAppointment},
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

pub fn routes() -> Router<AppState> {
    let authenticated = Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/customer/:id", get(appointments_by_customer))
        .route("/appointments/vehicle/:id", get(appointments_by_vehicle))
        .route("/appointments/date/:date", get(appointments_by_date))
        .route("/appointments/status/:status", get(appointments_by_status))
        .route(
            "/appointments/:id",
            get(get_appointment).put(update_appointment),
        )
        .route("/appointments/:id/status", patch(update_appointment_status))
        .with_auth();

    let admin = Router::new()
        .route(
            "/appointments/:id",
            axum::routing::delete(delete_appointment),
        )
        .with_roles(&[role::ADMINISTRATOR]);

    authenticated.merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(PaginationParams),
    responses((status = 200, description = "Appointment page returned")),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (appointments, total) = state
        .services
        .appointments
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(appointments, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    params(("id" = i32, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment returned"),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state
        .services
        .appointments
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Appointment", id))?;
    Ok(success_response(appointment))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/customer/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses((status = 200, description = "Appointments of the customer")),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn appointments_by_customer(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.appointments.by_customer(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/vehicle/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses((status = 200, description = "Appointments of the vehicle")),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn appointments_by_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.appointments.by_vehicle(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/date/{date}",
    params(("date" = String, Path, format = Date, description = "Calendar day, YYYY-MM-DD")),
    responses((status = 200, description = "Appointments on the day")),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn appointments_by_date(
    State(state): State<AppState>,
    PathParam(date): PathParam<NaiveDate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.appointments.by_date(date).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/status/{status}",
    params(("status" = AppointmentStatus, Path, description = "Appointment status")),
    responses((status = 200, description = "Appointments in the status")),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn appointments_by_status(
    State(state): State<AppState>,
    PathParam(status): PathParam<AppointmentStatus>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.appointments.by_status(status).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = NewAppointment,
    responses(
        (status = 201, description = "Appointment scheduled"),
        (status = 400, description = "Invalid input or unknown reference", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewAppointment>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(
        state.services.appointments.create(payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    params(("id" = i32, Path, description = "Appointment ID")),
    request_body = AppointmentChanges,
    responses(
        (status = 200, description = "Appointment updated"),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<AppointmentChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.appointments.update(id, payload).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/appointments/{id}/status",
    params(("id" = i32, Path, description = "Appointment ID")),
    request_body = AppointmentStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<AppointmentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .appointments
            .update_status(id, payload.status)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    params(("id" = i32, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment deleted"),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.appointments.delete(id).await?;
    Ok(deleted_response(format!("Appointment {} deleted", id)))
}
