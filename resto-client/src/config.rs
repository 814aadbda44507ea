//! Client configuration

use std::time::Duration;

/// Default reconciliation interval in seconds
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

/// Client configuration for connecting to the restaurant API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:5000/api")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_ms: 10_000,
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Create an API client from this configuration
    pub fn build_client(&self) -> crate::ClientResult<crate::ApiClient> {
        crate::ApiClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000/api")
    }
}

/// floor-monitor 配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | API_BASE_URL | http://localhost:5000/api | 后端 API 地址 |
/// | API_TOKEN | - | 已有的 Bearer token |
/// | API_EMAIL | - | 登录邮箱 (无 token 时使用) |
/// | API_PASSWORD | - | 登录密码 |
/// | REQUEST_TIMEOUT_MS | 10000 | 单次请求超时(毫秒) |
/// | RECONCILE_INTERVAL_SECS | 30 | 预约过期检查间隔(秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub client: ClientConfig,
    pub email: Option<String>,
    pub password: Option<String>,
    pub reconcile_interval_secs: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl MonitorConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:5000/api".into());
        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10_000);

        let mut client = ClientConfig::new(base_url).with_timeout_ms(timeout_ms);
        if let Ok(token) = std::env::var("API_TOKEN") {
            client = client.with_token(token);
        }

        Self {
            client,
            email: std::env::var("API_EMAIL").ok(),
            password: std::env::var("API_PASSWORD").ok(),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}
