// 数据库实体
// 对应 activities / vehicles / ride_groups / members 四张表的类型化记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 行程角色：车主提供座位，乘客寻找座位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

impl Role {
    /// 匹配时检索的是相反角色
    pub fn opposite(self) -> Role {
        match self {
            Role::Driver => Role::Passenger,
            Role::Passenger => Role::Driver,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Passenger => "passenger",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Role::Driver),
            "passenger" => Ok(Role::Passenger),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// 一次行程请求的一侧（车主发布或乘客求乘）。
/// 创建后除座位数外不再变更，匹配器绝不删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub start_place: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_place: String,
    pub end_lat: f64,
    pub end_lon: f64,
    pub departure_time: DateTime<Utc>,
    pub vehicle_type: Option<String>,
    pub price: Option<f64>,
    /// None 表示不限座位
    pub available_seats: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub model: String,
    pub license_plate: String,
    pub color: String,
}

/// 一个具体的行程实例，绑定一辆车和一个车主活动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub activity_id: String,
    pub start_time: DateTime<Utc>,
    pub vehicle_type: String,
    pub vehicle_id: String,
}

/// 参与者与群组的关联。
/// 乘客的 group_id 初始为空，匹配成功后才写入，是唯一会被更新的字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub activity_id: String,
    pub user_id: String,
    pub group_id: Option<String>,
    pub role: Role,
}

// 插入载荷，id 由存储层生成

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: String,
    pub role: Role,
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
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub user_id: String,
    pub model: String,
    pub license_plate: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub activity_id: String,
    pub start_time: DateTime<Utc>,
    pub vehicle_type: String,
    pub vehicle_id: String,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub activity_id: String,
    pub user_id: String,
    pub group_id: Option<String>,
    pub role: Role,
}
