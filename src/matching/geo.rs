use crate::common::GeoPoint;

/// 地球半径（公里）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 1度纬度约111km
pub const KM_PER_DEGREE_LAT: f64 = 111.0;

/// Haversine 公式计算两点间的大圆距离（公里）
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// 以中心点为基准、按半径展开的经纬度矩形范围。
/// 对圆形搜索区域的过覆盖近似，用于数据库粗筛，精确距离之后再算。
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        // 1度经度约 111 * cos(纬度) km，纬度越高越窄
        let lat_delta = radius_km / KM_PER_DEGREE_LAT;
        let lng_delta = radius_km / (KM_PER_DEGREE_LAT * center.lat.to_radians().cos());

        Self {
            min_lat: center.lat - lat_delta,
            max_lat: center.lat + lat_delta,
            min_lng: center.lng - lng_delta,
            max_lng: center.lng + lng_delta,
        }
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && p.lng >= self.min_lng
            && p.lng <= self.max_lng
    }
}
