// 存储契约
// 登记与匹配只通过这两个 trait 访问关系存储；
// 具体后端在构造时注入（Postgres 或测试用内存实现）。

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

use crate::database::entities::{NewActivity, NewGroup, NewMember, NewVehicle, Role};
use crate::matching::geo::BoundingBox;
use crate::matching::window::TimeWindow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// 候选活动的粗筛条件：相反角色 + 时间窗口 + 两个坐标矩形 + 排除本人
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    /// 要检索的候选者角色（已经是请求者的相反角色）
    pub role: Role,
    pub window: TimeWindow,
    pub pickup_box: BoundingBox,
    pub destination_box: BoundingBox,
    pub exclude_user_id: String,
    pub vehicle_type: Option<String>,
    /// 仅当乘客请求多个座位时设置
    pub min_seats: Option<i32>,
    pub limit: i64,
}

/// 粗筛返回的一行：活动字段加上它绑定的群组和车辆
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub activity_id: String,
    pub user_id: String,
    pub role: String,
    pub start_place: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_place: String,
    pub end_lat: f64,
    pub end_lon: f64,
    pub departure_time: DateTime<Utc>,
    pub vehicle_type: Option<String>,
    pub price: Option<f64>,
    pub available_seats: Option<i32>,
    pub group_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_plate: Option<String>,
    pub vehicle_color: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait RideStore: Clone + Send + Sync + 'static {
    type Tx: RideTx;

    /// 开启一个事务；整个登记单元在其中执行
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// 单个登记事务内可用的操作。
/// commit / rollback 消费事务本体，所有路径都必须走到其一。
#[allow(async_fn_in_trait)]
pub trait RideTx: Send {
    async fn insert_activity(&mut self, activity: &NewActivity) -> Result<String, StoreError>;

    async fn insert_vehicle(&mut self, vehicle: &NewVehicle) -> Result<String, StoreError>;

    async fn insert_group(&mut self, group: &NewGroup) -> Result<String, StoreError>;

    async fn insert_member(&mut self, member: &NewMember) -> Result<String, StoreError>;

    async fn find_candidates(
        &mut self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRow>, StoreError>;

    /// 把成员绑定到匹配的群组，同时对车主活动做座位数的比较-递减。
    /// 座位不足时返回 Ok(false)，不做任何修改；并发的第二个预订者由此被拒。
    async fn bind_member_to_group(
        &mut self,
        group_id: &str,
        member_id: &str,
        seats: i32,
    ) -> Result<bool, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
