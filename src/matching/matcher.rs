use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::GeoPoint;
use crate::database::entities::Role;
use crate::database::store::{CandidateQuery, CandidateRow, RideTx, StoreError};
use crate::matching::geo::{self, BoundingBox};
use crate::matching::score;
use crate::matching::window::{self, TimeWindow};

/// 匹配参数，默认值与算法原型一致：5公里、30分钟、候选上限50
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub max_distance_km: f64,
    pub time_flexibility_min: i64,
    pub candidate_limit: i64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_distance_km: 5.0,
            time_flexibility_min: 30,
            candidate_limit: 50,
        }
    }
}

/// 一次匹配检索的输入。role 是请求者自己的角色，匹配器检索相反角色。
/// 三个核心字段缺失时按"无匹配"处理，而不是报错。
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub user_id: String,
    pub role: Role,
    pub pickup: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub departure_time: Option<DateTime<Utc>>,
    pub vehicle_type: Option<String>,
    pub seats: i32,
}

/// 匹配到的对方活动摘要
#[derive(Debug, Clone, Serialize)]
pub struct MatchedActivity {
    pub activity_id: String,
    pub user_id: String,
    pub role: Role,
    pub pickup_place: String,
    pub pickup: GeoPoint,
    pub destination_place: String,
    pub destination: GeoPoint,
    pub departure_time: DateTime<Utc>,
    pub price: Option<f64>,
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleInfo {
    pub id: String,
    pub model: String,
    pub license_plate: String,
    pub color: String,
}

/// 匹配结果，瞬态值，不落库
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub activity: MatchedActivity,
    /// 公里，保留一位小数
    pub pickup_distance_km: f64,
    pub destination_distance_km: f64,
    /// 分钟，取整
    pub time_difference_min: i64,
    /// 0-100，取整
    pub compatibility_score: f64,
    pub group_id: Option<String>,
    pub vehicle: Option<VehicleInfo>,
}

#[derive(Debug, Clone, Copy)]
pub struct RideMatcher {
    options: MatchOptions,
}

impl RideMatcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// 在当前事务内检索最优匹配。
    /// 流程：时间窗口 + 双矩形粗筛 → 精确距离 → 硬性截断 → 评分 → 稳定排序取最优。
    /// 只读，不修改任何实体。
    pub async fn find_match<T: RideTx>(
        &self,
        tx: &mut T,
        request: &MatchRequest,
    ) -> Result<Option<MatchResult>, StoreError> {
        let (Some(pickup), Some(destination), Some(departure)) =
            (request.pickup, request.destination, request.departure_time)
        else {
            tracing::warn!(user_id = %request.user_id, "match request missing pickup/destination/departure");
            return Ok(None);
        };

        let opts = &self.options;
        let time_window = TimeWindow::around(departure, opts.time_flexibility_min);

        let query = CandidateQuery {
            role: request.role.opposite(),
            window: time_window,
            pickup_box: BoundingBox::around(pickup, opts.max_distance_km),
            destination_box: BoundingBox::around(destination, opts.max_distance_km),
            exclude_user_id: request.user_id.clone(),
            vehicle_type: request.vehicle_type.clone(),
            min_seats: (request.role == Role::Passenger && request.seats > 1)
                .then_some(request.seats),
            limit: opts.candidate_limit,
        };

        let candidates = tx.find_candidates(&query).await?;
        if candidates.is_empty() {
            return Ok(None);
        }

        // 粗筛是超集，这里用精确距离做硬性截断后再评分
        let mut scored: Vec<(f64, CandidateRow, f64, f64, f64)> = candidates
            .into_iter()
            .filter_map(|row| {
                let pickup_km =
                    geo::haversine_km(pickup, GeoPoint::new(row.start_lat, row.start_lon));
                let destination_km =
                    geo::haversine_km(destination, GeoPoint::new(row.end_lat, row.end_lon));
                if pickup_km > opts.max_distance_km || destination_km > opts.max_distance_km {
                    return None;
                }

                let time_diff_min = window::minutes_between(departure, row.departure_time);
                let s = score::compatibility_score(
                    pickup_km,
                    destination_km,
                    time_diff_min,
                    opts.max_distance_km,
                    opts.time_flexibility_min as f64,
                );
                Some((s, row, pickup_km, destination_km, time_diff_min))
            })
            .collect();

        if scored.is_empty() {
            return Ok(None);
        }

        // sort_by 是稳定排序，分数并列时保持存储层给出的顺序
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let (best_score, row, pickup_km, destination_km, time_diff_min) = scored.swap_remove(0);

        tracing::debug!(
            activity_id = %row.activity_id,
            score = best_score,
            "best candidate selected"
        );

        Ok(Some(build_result(
            row,
            pickup_km,
            destination_km,
            time_diff_min,
            best_score,
        )))
    }
}

fn build_result(
    row: CandidateRow,
    pickup_km: f64,
    destination_km: f64,
    time_diff_min: f64,
    score: f64,
) -> MatchResult {
    let role = row.role.parse().unwrap_or(Role::Driver);

    let vehicle = match (&row.vehicle_id, &row.vehicle_model, &row.vehicle_plate, &row.vehicle_color)
    {
        (Some(id), Some(model), Some(plate), Some(color)) => Some(VehicleInfo {
            id: id.clone(),
            model: model.clone(),
            license_plate: plate.clone(),
            color: color.clone(),
        }),
        _ => None,
    };

    MatchResult {
        activity: MatchedActivity {
            activity_id: row.activity_id,
            user_id: row.user_id,
            role,
            pickup_place: row.start_place,
            pickup: GeoPoint::new(row.start_lat, row.start_lon),
            destination_place: row.end_place,
            destination: GeoPoint::new(row.end_lat, row.end_lon),
            departure_time: row.departure_time,
            price: row.price,
            vehicle_type: row.vehicle_type,
        },
        pickup_distance_km: round_tenth(pickup_km),
        destination_distance_km: round_tenth(destination_km),
        time_difference_min: time_diff_min.round() as i64,
        compatibility_score: score.round(),
        group_id: row.group_id,
        vehicle,
    }
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
