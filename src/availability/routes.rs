//! HTTP routes for the availability API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

// Extractor rejections are turned into `AppError` so bad input gets the JSON
// error body instead of axum's plain-text one.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type QueryParams<T> = std::result::Result<Query<T>, QueryRejection>;
type PathId = std::result::Result<Path<Uuid>, PathRejection>;

use super::calculators::{self, QuoteResult};
use super::engine;
use super::requests::{
    AvailabilityQuery, CreateBookingRequest, EvaluateSlotRequest, QuoteRequest, SlotsQuery,
    SubFieldQuoteQuery, UpdateBookingStatusRequest,
};
use super::responses::{
    AvailabilityResponse, BookingResponse, FieldScheduleResponse, QuoteResponse, SlotListResponse,
};
use super::services;

/// Availability, pricing and booking routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/availability/evaluate", post(evaluate))
        .route("/fields/:id/opening-hours", get(field_schedule))
        .route("/subfields/:id/availability", get(check_availability))
        .route("/subfields/:id/slots", get(list_slots))
        .route("/subfields/:id/quote", get(quote_subfield))
        .route("/pricing/quote", post(quote))
        .route("/bookings", post(create_booking))
        .route("/bookings/:id/status", patch(update_booking_status))
}

/// Run the engine over inline data
async fn evaluate(payload: JsonBody<EvaluateSlotRequest>) -> Result<Json<AvailabilityResponse>> {
    let Json(req) = payload?;
    let verdict = engine::evaluate_slot_with_maintenance(
        req.subfield_status,
        &req.opening_hours,
        &req.existing_bookings,
        &req.maintenance,
        &req.candidate,
    );
    Ok(Json(verdict.into()))
}

async fn field_schedule(
    State(state): State<AppState>,
    path: PathId,
) -> Result<Json<FieldScheduleResponse>> {
    let Path(field_id) = path?;
    let (field, hours) = services::field_schedule(&state.db, &state.cache, field_id).await?;
    Ok(Json(FieldScheduleResponse::new(field, hours.as_ref().clone())))
}

async fn check_availability(
    State(state): State<AppState>,
    path: PathId,
    query: QueryParams<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let Path(subfield_id) = path?;
    let Query(query) = query?;
    let candidate = query.into_candidate();
    let verdict =
        services::check_availability(&state.db, &state.cache, subfield_id, &candidate).await?;
    Ok(Json(verdict.into()))
}

async fn list_slots(
    State(state): State<AppState>,
    path: PathId,
    query: QueryParams<SlotsQuery>,
) -> Result<Json<SlotListResponse>> {
    let Path(subfield_id) = path?;
    let Query(query) = query?;
    let duration_minutes = query
        .duration_minutes
        .unwrap_or(state.config.slot_duration_minutes);
    let step_minutes = query.step_minutes.unwrap_or(state.config.slot_step_minutes);
    if duration_minutes == 0 || step_minutes == 0 {
        return Err(AppError::BadRequest(
            "duration_minutes and step_minutes must be positive".to_string(),
        ));
    }

    let listing = services::list_available_slots(
        &state.db,
        &state.cache,
        subfield_id,
        query.date,
        duration_minutes,
        step_minutes,
    )
    .await?;

    Ok(Json(SlotListResponse {
        subfield_id,
        date: query.date,
        opening_window: listing.opening_window,
        duration_minutes,
        step_minutes,
        slots: listing.slots,
    }))
}

fn quote_response(result: QuoteResult) -> QuoteResponse {
    QuoteResponse {
        start: result.range.start,
        end: result.range.end,
        duration_minutes: result.range.duration_minutes(),
        hours: result.hours,
        price_per_hour: result.price_per_hour,
        total: result.total,
    }
}

fn invalid_range() -> AppError {
    AppError::BadRequest("start and end must be HH:MM with end after start".to_string())
}

/// Price a range at an explicit hourly rate
async fn quote(
    State(state): State<AppState>,
    payload: JsonBody<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let Json(req) = payload?;
    let currency = req
        .currency
        .as_deref()
        .unwrap_or(state.config.currency.as_str());
    let result = calculators::quote(req.price_per_hour, &req.start, &req.end, currency)
        .ok_or_else(invalid_range)?;
    Ok(Json(quote_response(result)))
}

async fn quote_subfield(
    State(state): State<AppState>,
    path: PathId,
    query: QueryParams<SubFieldQuoteQuery>,
) -> Result<Json<QuoteResponse>> {
    let Path(subfield_id) = path?;
    let Query(query) = query?;
    let result = services::quote_for_subfield(
        &state.db,
        &state.cache,
        subfield_id,
        &query.start,
        &query.end,
        &state.config.currency,
    )
    .await?
    .ok_or_else(invalid_range)?;
    Ok(Json(quote_response(result)))
}

async fn create_booking(
    State(state): State<AppState>,
    payload: JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let Json(req) = payload?;
    let booking =
        services::create_booking(&state.db, req.subfield_id, req.customer_id, &req.candidate())
            .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn update_booking_status(
    State(state): State<AppState>,
    path: PathId,
    payload: JsonBody<UpdateBookingStatusRequest>,
) -> Result<Json<BookingResponse>> {
    let Path(booking_id) = path?;
    let Json(req) = payload?;
    let booking = services::update_booking_status(&state.db, booking_id, req.status).await?;
    Ok(Json(booking.into()))
}
