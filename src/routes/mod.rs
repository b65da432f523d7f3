pub mod ride;

/// 健康检查
pub async fn health() -> &'static str {
    "ok"
}
