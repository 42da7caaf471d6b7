use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use shared::{
    parse_reservation_date, InventoryStats, Reservation, ReservationDetails, Tire, TireDraft, TireFilter,
    ValidationError,
};
use tower_http::trace::TraceLayer;

use crate::error::InventoryError;
use crate::inventory::InventoryStore;
use crate::reservations::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryStore,
    pub reservations: ReservationService,
}

#[derive(Debug, Default, Deserialize)]
pub struct TireQuery {
    pub condition: Option<String>,
    pub tire_type: Option<String>,
    pub stock: Option<String>,
    pub q: Option<String>,
}

impl TireQuery {
    fn to_filter(&self) -> Result<TireFilter, InventoryError> {
        Ok(TireFilter::from_params(
            self.condition.as_deref(),
            self.tire_type.as_deref(),
            self.stock.as_deref(),
            self.q.as_deref(),
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReservationQuery {
    pub customer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub tire_id: i32,
    pub customer_name: String,
    /// `YYYY-MM-DD`; today when omitted.
    pub reservation_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: InventoryError) -> ApiError {
    let status = match &err {
        InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
        InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        InventoryError::NotAvailable { .. } => StatusCode::CONFLICT,
        InventoryError::Storage(_) => {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        }),
    )
}

// Bodies and path ids axum cannot decode are reported like any other invalid input.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| error_response(ValidationError::Malformed(rejection.body_text()).into()))
}

fn tire_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| error_response(ValidationError::Malformed(rejection.body_text()).into()))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tires", get(list_tires).post(create_tire))
        .route("/tires/available", get(available_tires))
        .route("/tires/export.csv", get(export_tires))
        .route("/tires/:id", get(get_tire).put(update_tire).delete(delete_tire))
        .route("/stats", get(stats))
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/customer/:customer_name", get(customer_reservations))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn health_check(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.inventory.check_connection().await.map_err(error_response)?;
    Ok("OK")
}

pub async fn list_tires(
    State(state): State<AppState>,
    Query(query): Query<TireQuery>,
) -> Result<Json<Vec<Tire>>, ApiError> {
    let filter = query.to_filter().map_err(error_response)?;
    let tires = state.inventory.list(&filter).await.map_err(error_response)?;
    Ok(Json(tires))
}

pub async fn available_tires(State(state): State<AppState>) -> Result<Json<Vec<Tire>>, ApiError> {
    let tires = state.inventory.available().await.map_err(error_response)?;
    Ok(Json(tires))
}

pub async fn export_tires(
    State(state): State<AppState>,
    Query(query): Query<TireQuery>,
) -> Result<Response, ApiError> {
    let filter = query.to_filter().map_err(error_response)?;
    let csv = state.inventory.export_csv(&filter).await.map_err(error_response)?;
    let filename = format!("attachment; filename=\"tires_{}.csv\"", Local::now().format("%Y%m%d_%H%M%S"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response())
}

pub async fn create_tire(
    State(state): State<AppState>,
    body: Result<Json<TireDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Tire>), ApiError> {
    let draft = json_body(body)?;
    let tire = state.inventory.create(draft).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(tire)))
}

pub async fn get_tire(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Tire>, ApiError> {
    let id = tire_id(path)?;
    let tire = state.inventory.get_by_id(id).await.map_err(error_response)?;
    Ok(Json(tire))
}

pub async fn update_tire(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<TireDraft>, JsonRejection>,
) -> Result<Json<Tire>, ApiError> {
    let id = tire_id(path)?;
    let draft = json_body(body)?;
    let tire = state.inventory.update(id, draft).await.map_err(error_response)?;
    Ok(Json(tire))
}

pub async fn delete_tire(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = tire_id(path)?;
    state.inventory.delete(id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<InventoryStats>, ApiError> {
    let stats = state.inventory.stats().await.map_err(error_response)?;
    Ok(Json(stats))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<Vec<ReservationDetails>>, ApiError> {
    let reservations = state
        .reservations
        .list_reservations(query.customer.as_deref())
        .await
        .map_err(error_response)?;
    Ok(Json(reservations))
}

pub async fn customer_reservations(
    State(state): State<AppState>,
    Path(customer_name): Path<String>,
) -> Result<Json<Vec<ReservationDetails>>, ApiError> {
    let reservations = state
        .reservations
        .list_reservations(Some(&customer_name))
        .await
        .map_err(error_response)?;
    Ok(Json(reservations))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let request = json_body(body)?;
    let reservation_date = match request.reservation_date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => parse_reservation_date(date)
            .map_err(InventoryError::from)
            .map_err(error_response)?,
        _ => Local::now().date_naive(),
    };

    let reservation = state
        .reservations
        .reserve(
            request.tire_id,
            &request.customer_name,
            reservation_date,
            request.notes.as_deref(),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
