use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::GeoPoint;
use crate::database::entities::{NewActivity, NewGroup, NewMember, NewVehicle, Role};
use crate::database::store::{RideStore, RideTx};
use crate::error::RideError;
use crate::matching::{MatchOptions, MatchRequest, MatchResult, RideMatcher};

/// 车主未指定时的默认座位数
const DEFAULT_DRIVER_SEATS: i32 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleInfoRequest {
    pub model: Option<String>,
    pub license_plate: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareRideRequest {
    pub user_id: String,
    pub pickup_location: Option<String>,
    pub destination: Option<String>,
    pub pickup_position: Option<GeoPoint>,
    pub destination_position: Option<GeoPoint>,
    pub departure_time: Option<DateTime<Utc>>,
    pub estimated_price: Option<f64>,
    pub vehicle_type_preference: Option<String>,
    pub seats_available: Option<i32>,
    pub vehicle_info: Option<VehicleInfoRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookRideRequest {
    pub user_id: String,
    pub pickup_location: Option<String>,
    pub destination: Option<String>,
    pub pickup_position: Option<GeoPoint>,
    pub destination_position: Option<GeoPoint>,
    pub departure_time: Option<DateTime<Utc>>,
    pub estimated_price: Option<f64>,
    pub vehicle_type_preference: Option<String>,
    pub seats: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ShareRideOutcome {
    pub activity_id: String,
    pub group_id: String,
    pub vehicle_id: String,
    pub matched_ride: Option<MatchResult>,
}

#[derive(Debug, Serialize)]
pub struct BookRideOutcome {
    pub activity_id: String,
    pub member_id: String,
    /// 匹配成功并抢到座位后才会绑定
    pub group_id: Option<String>,
    pub matched_ride: Option<MatchResult>,
}

/// 登记单元：先持久化请求者自己的活动，再在同一事务内匹配。
/// 持久化失败整单回滚；匹配失败降级为"已登记、未匹配"，照常提交。
#[derive(Clone)]
pub struct RideRegistrar<S: RideStore> {
    store: S,
    matcher: RideMatcher,
}

impl<S: RideStore> RideRegistrar<S> {
    pub fn new(store: S, options: MatchOptions) -> Self {
        Self {
            store,
            matcher: RideMatcher::new(options),
        }
    }

    /// 车主发布行程：活动 + 车辆 + 群组 + 成员四笔插入，再检索乘客
    pub async fn share_ride(&self, req: ShareRideRequest) -> Result<ShareRideOutcome, RideError> {
        let share = validate_share(req)?;

        let mut tx = self.store.begin().await.map_err(RideError::Persistence)?;
        match self.share_in_tx(&mut tx, &share).await {
            Ok(outcome) => {
                tx.commit().await.map_err(RideError::Persistence)?;
                tracing::info!(
                    activity_id = %outcome.activity_id,
                    matched = outcome.matched_ride.is_some(),
                    "ride shared"
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// 乘客预订：活动 + 成员两笔插入，匹配到车主后绑定其群组
    pub async fn book_ride(&self, req: BookRideRequest) -> Result<BookRideOutcome, RideError> {
        let booking = validate_booking(req)?;

        let mut tx = self.store.begin().await.map_err(RideError::Persistence)?;
        match self.book_in_tx(&mut tx, &booking).await {
            Ok(outcome) => {
                tx.commit().await.map_err(RideError::Persistence)?;
                tracing::info!(
                    activity_id = %outcome.activity_id,
                    bound_group = ?outcome.group_id,
                    "ride booked"
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn share_in_tx(
        &self,
        tx: &mut S::Tx,
        share: &ValidShare,
    ) -> Result<ShareRideOutcome, RideError> {
        let activity_id = tx
            .insert_activity(&NewActivity {
                user_id: share.user_id.clone(),
                role: Role::Driver,
                start_place: share.pickup_place.clone(),
                start_lat: share.pickup.lat,
                start_lon: share.pickup.lng,
                end_place: share.destination_place.clone(),
                end_lat: share.destination.lat,
                end_lon: share.destination.lng,
                departure_time: share.departure_time,
                vehicle_type: share.vehicle_type.clone(),
                price: share.price,
                available_seats: Some(share.seats_available),
            })
            .await?;

        let vehicle_id = tx
            .insert_vehicle(&NewVehicle {
                user_id: share.user_id.clone(),
                model: share.vehicle_model.clone(),
                license_plate: share.vehicle_plate.clone(),
                color: share.vehicle_color.clone(),
            })
            .await?;

        let group_id = tx
            .insert_group(&NewGroup {
                activity_id: activity_id.clone(),
                start_time: share.departure_time,
                vehicle_type: share.vehicle_type.clone().unwrap_or_else(|| "car".into()),
                vehicle_id: vehicle_id.clone(),
            })
            .await?;

        // 车主自己的成员行在创建时即绑定新群组
        tx.insert_member(&NewMember {
            activity_id: activity_id.clone(),
            user_id: share.user_id.clone(),
            group_id: Some(group_id.clone()),
            role: Role::Driver,
        })
        .await?;

        let matched_ride = self
            .soft_match(
                tx,
                &MatchRequest {
                    user_id: share.user_id.clone(),
                    role: Role::Driver,
                    pickup: Some(share.pickup),
                    destination: Some(share.destination),
                    departure_time: Some(share.departure_time),
                    vehicle_type: share.vehicle_type.clone(),
                    seats: 1,
                },
            )
            .await;

        Ok(ShareRideOutcome {
            activity_id,
            group_id,
            vehicle_id,
            matched_ride,
        })
    }

    async fn book_in_tx(
        &self,
        tx: &mut S::Tx,
        booking: &ValidBooking,
    ) -> Result<BookRideOutcome, RideError> {
        let activity_id = tx
            .insert_activity(&NewActivity {
                user_id: booking.user_id.clone(),
                role: Role::Passenger,
                start_place: booking.pickup_place.clone(),
                start_lat: booking.pickup.lat,
                start_lon: booking.pickup.lng,
                end_place: booking.destination_place.clone(),
                end_lat: booking.destination.lat,
                end_lon: booking.destination.lng,
                departure_time: booking.departure_time,
                vehicle_type: booking.vehicle_type.clone(),
                price: booking.price,
                available_seats: None,
            })
            .await?;

        let member_id = tx
            .insert_member(&NewMember {
                activity_id: activity_id.clone(),
                user_id: booking.user_id.clone(),
                group_id: None,
                role: Role::Passenger,
            })
            .await?;

        let matched = self
            .soft_match(
                tx,
                &MatchRequest {
                    user_id: booking.user_id.clone(),
                    role: Role::Passenger,
                    pickup: Some(booking.pickup),
                    destination: Some(booking.destination),
                    departure_time: Some(booking.departure_time),
                    vehicle_type: booking.vehicle_type.clone(),
                    seats: booking.seats,
                },
            )
            .await;

        // 匹配到车主群组时抢座并绑定；抢不到就当作未匹配
        let mut group_id = None;
        let matched_ride = match matched {
            Some(result) => {
                if let Some(gid) = result.group_id.clone() {
                    if tx
                        .bind_member_to_group(&gid, &member_id, booking.seats)
                        .await?
                    {
                        group_id = Some(gid);
                        Some(result)
                    } else {
                        tracing::info!(
                            group_id = %gid,
                            "matched group has no remaining seats, registering unmatched"
                        );
                        None
                    }
                } else {
                    Some(result)
                }
            }
            None => None,
        };

        Ok(BookRideOutcome {
            activity_id,
            member_id,
            group_id,
            matched_ride,
        })
    }

    /// 匹配阶段的任何失败都不允许打断登记本身
    async fn soft_match(&self, tx: &mut S::Tx, request: &MatchRequest) -> Option<MatchResult> {
        match self.matcher.find_match(tx, request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "matching failed, committing registration unmatched");
                None
            }
        }
    }
}

struct ValidShare {
    user_id: String,
    pickup_place: String,
    destination_place: String,
    pickup: GeoPoint,
    destination: GeoPoint,
    departure_time: DateTime<Utc>,
    price: Option<f64>,
    vehicle_type: Option<String>,
    seats_available: i32,
    vehicle_model: String,
    vehicle_plate: String,
    vehicle_color: String,
}

struct ValidBooking {
    user_id: String,
    pickup_place: String,
    destination_place: String,
    pickup: GeoPoint,
    destination: GeoPoint,
    departure_time: DateTime<Utc>,
    price: Option<f64>,
    vehicle_type: Option<String>,
    seats: i32,
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, RideError> {
    value.ok_or_else(|| RideError::Validation(format!("missing required field: {field}")))
}

fn validate_share(req: ShareRideRequest) -> Result<ValidShare, RideError> {
    let vehicle = require(req.vehicle_info, "vehicle_info")?;
    let seats_available = req.seats_available.unwrap_or(DEFAULT_DRIVER_SEATS);
    if seats_available < 1 {
        return Err(RideError::Validation("seats_available must be >= 1".into()));
    }

    Ok(ValidShare {
        user_id: req.user_id,
        pickup_place: require(req.pickup_location, "pickup_location")?,
        destination_place: require(req.destination, "destination")?,
        pickup: require(req.pickup_position, "pickup_position")?,
        destination: require(req.destination_position, "destination_position")?,
        departure_time: require(req.departure_time, "departure_time")?,
        price: req.estimated_price,
        vehicle_type: req.vehicle_type_preference,
        seats_available,
        vehicle_model: require(vehicle.model, "vehicle_info.model")?,
        vehicle_plate: require(vehicle.license_plate, "vehicle_info.license_plate")?,
        vehicle_color: require(vehicle.color, "vehicle_info.color")?,
    })
}

fn validate_booking(req: BookRideRequest) -> Result<ValidBooking, RideError> {
    let seats = req.seats.unwrap_or(1);
    if seats < 1 {
        return Err(RideError::Validation("seats must be >= 1".into()));
    }

    Ok(ValidBooking {
        user_id: req.user_id,
        pickup_place: require(req.pickup_location, "pickup_location")?,
        destination_place: require(req.destination, "destination")?,
        pickup: require(req.pickup_position, "pickup_position")?,
        destination: require(req.destination_position, "destination_position")?,
        departure_time: require(req.departure_time, "departure_time")?,
        price: req.estimated_price,
        vehicle_type: req.vehicle_type_preference,
        seats,
    })
}
