// 兼容性评分
// 接送距离、目的地距离、时间偏差的加权组合，0-100分

/// 接人距离最多扣25分
pub const PICKUP_WEIGHT: f64 = 25.0;
/// 目的地距离最多扣25分
pub const DESTINATION_WEIGHT: f64 = 25.0;
/// 时间偏差最多扣50分
pub const TIME_WEIGHT: f64 = 50.0;

pub const MAX_SCORE: f64 = 100.0;

/// 计算兼容性分数，结果限制在 [0, 100]
pub fn compatibility_score(
    pickup_km: f64,
    destination_km: f64,
    time_diff_min: f64,
    max_distance_km: f64,
    time_flexibility_min: f64,
) -> f64 {
    let score = MAX_SCORE
        - penalty(pickup_km, max_distance_km, PICKUP_WEIGHT)
        - penalty(destination_km, max_distance_km, DESTINATION_WEIGHT)
        - penalty(time_diff_min, time_flexibility_min, TIME_WEIGHT);

    score.clamp(0.0, MAX_SCORE)
}

/// 零偏差不扣分；上限被配成0时，任何正偏差直接扣穿到0分而不是产生 NaN
fn penalty(value: f64, limit: f64, weight: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    (value / limit) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_overlap_scores_full() {
        assert_eq!(compatibility_score(0.0, 0.0, 0.0, 5.0, 30.0), 100.0);
    }

    #[test]
    fn boundary_candidate_scores_zero() {
        // 两段距离都在上限、时间差拉满，刚好扣完100分
        assert_eq!(compatibility_score(5.0, 5.0, 30.0, 5.0, 30.0), 0.0);
    }

    #[test]
    fn score_floors_at_zero() {
        assert_eq!(compatibility_score(20.0, 20.0, 120.0, 5.0, 30.0), 0.0);
    }

    #[test]
    fn score_is_monotonic_in_each_input() {
        let base = compatibility_score(1.0, 1.0, 5.0, 5.0, 30.0);
        assert!(compatibility_score(2.0, 1.0, 5.0, 5.0, 30.0) < base);
        assert!(compatibility_score(1.0, 2.0, 5.0, 5.0, 30.0) < base);
        assert!(compatibility_score(1.0, 1.0, 10.0, 5.0, 30.0) < base);
    }

    #[test]
    fn weights_split_25_25_50() {
        // 单项拉满时各自的扣分幅度
        assert_eq!(compatibility_score(5.0, 0.0, 0.0, 5.0, 30.0), 75.0);
        assert_eq!(compatibility_score(0.0, 5.0, 0.0, 5.0, 30.0), 75.0);
        assert_eq!(compatibility_score(0.0, 0.0, 30.0, 5.0, 30.0), 50.0);
    }

    #[test]
    fn zero_limits_never_produce_nan() {
        // 上限被错误配置为0时分数仍然有限且在界内
        let exact = compatibility_score(0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(exact.is_finite());
        assert_eq!(exact, 100.0);

        let off = compatibility_score(1.0, 0.0, 5.0, 0.0, 0.0);
        assert!(off.is_finite());
        assert_eq!(off, 0.0);
    }

    #[test]
    fn always_within_bounds() {
        for pickup in [0.0, 1.0, 3.0, 5.0, 9.0] {
            for time in [0.0, 10.0, 30.0, 90.0] {
                let s = compatibility_score(pickup, pickup, time, 5.0, 30.0);
                assert!((0.0..=100.0).contains(&s));
            }
        }
    }
}
