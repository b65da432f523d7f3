// 匹配模块
// 包含地理计算、时间窗口、兼容性评分和匹配编排

pub mod geo;
pub mod matcher;
pub mod score;
pub mod window;

pub use matcher::{MatchOptions, MatchRequest, MatchResult, RideMatcher};
