use crate::types::Instant;

/// 获取当前 UTC 时间
pub fn now_utc() -> Instant {
    chrono::Utc::now()
}
