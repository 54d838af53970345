use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub datalab: DatalabConfig,
    pub searchad: SearchAdConfig,
    pub analysis: AnalysisConfig,
}

/// DataLab 搜索趋势接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatalabConfig {
    pub url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_secs: u64,
}

/// SearchAd 关键词工具接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchAdConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub customer_id: Option<String>,
    pub timeout_secs: u64,
    // 429 后重签名重试前的等待
    pub retry_delay_ms: u64,
}

impl SearchAdConfig {
    /// 三项凭证齐全时才视为已配置。
    pub fn has_credentials(&self) -> bool {
        [&self.api_key, &self.secret_key, &self.customer_id]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// 对齐与估算参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // 相邻两次上游调用的最小间隔
    pub call_interval_ms: u64,
    // 分段扇出的回溯天数 (日粒度)
    pub segment_window_days: u32,
    // 月度趋势的回溯天数
    pub trend_window_days: u32,
    // 单组占比之和允许偏离 100 的幅度
    pub proportion_tolerance: f64,
}

impl Default for DatalabConfig {
    fn default() -> Self {
        Self {
            url: "https://openapi.naver.com/v1/datalab/search".to_string(),
            client_id: None,
            client_secret: None,
            timeout_secs: 10,
        }
    }
}

impl Default for SearchAdConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.naver.com".to_string(),
            api_key: None,
            secret_key: None,
            customer_id: None,
            timeout_secs: 10,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            call_interval_ms: 50,
            segment_window_days: 31,
            trend_window_days: 365,
            proportion_tolerance: 0.5,
        }
    }
}
