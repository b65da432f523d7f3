use chrono::{DateTime, Duration, Utc};

/// 围绕期望出发时间的闭区间 [departure - flexibility, departure + flexibility]
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn around(departure: DateTime<Utc>, flexibility_min: i64) -> Self {
        let flex = Duration::minutes(flexibility_min);
        Self {
            start: departure - flex,
            end: departure + flex,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// 两个时间点之间的分钟差（绝对值，小数）
pub fn minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (a - b).num_seconds().abs() as f64 / 60.0
}
