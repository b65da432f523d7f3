use std::env;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// 匹配时允许的最大接送距离（公里）
    pub match_max_distance_km: f64,
    /// 出发时间允许的弹性范围（分钟）
    pub match_time_flexibility_min: i64,
    /// 粗筛候选集的上限
    pub match_candidate_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            match_max_distance_km: positive_f64(env::var("MATCH_MAX_DISTANCE_KM").ok(), 5.0),
            match_time_flexibility_min: positive_i64(
                env::var("MATCH_TIME_FLEXIBILITY_MIN").ok(),
                30,
            ),
            match_candidate_limit: positive_i64(env::var("MATCH_CANDIDATE_LIMIT").ok(), 50),
        })
    }
}

// 匹配参数作为除数和上限使用，非正值一律回退到默认值

fn positive_f64(raw: Option<String>, default: f64) -> f64 {
    raw.and_then(|v| v.parse().ok())
        .filter(|v: &f64| *v > 0.0)
        .unwrap_or(default)
}

fn positive_i64(raw: Option<String>, default: i64) -> i64 {
    raw.and_then(|v| v.parse().ok())
        .filter(|v: &i64| *v > 0)
        .unwrap_or(default)
}
