use serde::Serialize;

use crate::matching::MatchResult;
use crate::rides::{BookRideOutcome, ShareRideOutcome};

#[derive(Serialize)]
pub struct ShareRideResponse {
    pub message: String,
    pub ride_id: String,
    pub group_id: String,
    pub matched_ride: Option<MatchResult>,
}

impl From<ShareRideOutcome> for ShareRideResponse {
    fn from(outcome: ShareRideOutcome) -> Self {
        let message = if outcome.matched_ride.is_some() {
            "ride shared, passenger matched".to_string()
        } else {
            "ride shared, waiting for passengers".to_string()
        };
        Self {
            message,
            ride_id: outcome.activity_id,
            group_id: outcome.group_id,
            matched_ride: outcome.matched_ride,
        }
    }
}

#[derive(Serialize)]
pub struct BookRideResponse {
    pub message: String,
    pub booking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub matched_ride: Option<MatchResult>,
}

impl From<BookRideOutcome> for BookRideResponse {
    fn from(outcome: BookRideOutcome) -> Self {
        let message = if outcome.group_id.is_some() {
            "booking confirmed".to_string()
        } else {
            "booking registered, waiting for a driver".to_string()
        };
        Self {
            message,
            booking_id: outcome.activity_id,
            group_id: outcome.group_id,
            matched_ride: outcome.matched_ride,
        }
    }
}
