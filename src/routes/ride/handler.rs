use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::error::RideError;
use crate::rides::{BookRideRequest, ShareRideRequest};
use crate::utils::success_to_api_response;

use super::model::{BookRideResponse, ShareRideResponse};

#[axum::debug_handler]
pub async fn share_ride(
    State(state): State<AppState>,
    Json(req): Json<ShareRideRequest>,
) -> Result<impl IntoResponse, RideError> {
    let outcome = state.registrar.share_ride(req).await?;
    Ok((
        StatusCode::CREATED,
        success_to_api_response(ShareRideResponse::from(outcome)),
    ))
}

#[axum::debug_handler]
pub async fn book_ride(
    State(state): State<AppState>,
    Json(req): Json<BookRideRequest>,
) -> Result<impl IntoResponse, RideError> {
    let outcome = state.registrar.book_ride(req).await?;
    Ok((
        StatusCode::CREATED,
        success_to_api_response(BookRideResponse::from(outcome)),
    ))
}
