use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use kwlens_core::common::time::{RealTimeProvider, TimeProvider};
use kwlens_core::config::SearchAdConfig;
use kwlens_core::volume::entity::KeywordStat;
use kwlens_core::volume::error::VolumeError;
use kwlens_core::volume::port::VolumeProvider;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// 关键词工具接口路径，同时参与签名。
pub const KEYWORD_TOOL_URI: &str = "/keywordstool";

/// 低于披露下限 (如 "< 10") 的计数替换值。
const BELOW_THRESHOLD_COUNT: u64 = 5;

/// # Summary
/// 计算 SearchAd 请求签名。
///
/// # Logic
/// 对 `"{timestamp}.{method}.{uri}"` 做 HMAC-SHA256，再做标准 Base64 编码。
pub fn sign(secret: &str, timestamp: &str, method: &str, uri: &str) -> Result<String, VolumeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| VolumeError::Config(e.to_string()))?;
    mac.update(format!("{}.{}.{}", timestamp, method, uri).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// # Summary
/// 把检索量字段转换为整数。
///
/// # Logic
/// 1. 数字取整数部分，负数记为 0。
/// 2. 字符串去掉千分位逗号；以 `<` 开头 (如 "< 10") 记为 5。
/// 3. 其余无法解析的值记为 0。
pub fn parse_count(raw: &Value) -> u64 {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .and_then(|d| d.trunc().to_u64())
            })
            .unwrap_or(0),
        Value::String(s) => {
            let stripped = s.trim().replace(',', "");
            if stripped.starts_with('<') {
                BELOW_THRESHOLD_COUNT
            } else {
                stripped.parse::<u64>().unwrap_or(0)
            }
        }
        _ => 0,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordToolResponse {
    #[serde(default)]
    keyword_list: Vec<KeywordToolRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordToolRow {
    #[serde(default)]
    rel_keyword: Option<String>,
    #[serde(default)]
    monthly_pc_qc_cnt: Value,
    #[serde(default)]
    monthly_mobile_qc_cnt: Value,
    #[serde(default)]
    comp_idx: Option<String>,
}

impl From<KeywordToolRow> for KeywordStat {
    fn from(row: KeywordToolRow) -> Self {
        KeywordStat::new(
            row.rel_keyword.unwrap_or_default(),
            parse_count(&row.monthly_pc_qc_cnt),
            parse_count(&row.monthly_mobile_qc_cnt),
            row.comp_idx.unwrap_or_default(),
        )
    }
}

/// # Summary
/// Naver SearchAd 关键词工具数据源。
///
/// # Invariants
/// - 每次请求都用当前时间戳重新签名。
/// - 429 时等待 `retry_delay` 后重新签名重试一次，仍失败则返回错误。
#[derive(Clone)]
pub struct SearchAdProvider {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    customer_id: String,
    retry_delay: Duration,
    clock: Arc<dyn TimeProvider>,
}

impl SearchAdProvider {
    /// # Summary
    /// 按配置创建数据源。
    ///
    /// # Returns
    /// 三项凭证任一缺失或客户端构建失败时返回 `VolumeError::Config`。
    pub fn new(config: &SearchAdConfig) -> Result<Self, VolumeError> {
        let (Some(api_key), Some(secret_key), Some(customer_id)) = (
            config.api_key.as_deref(),
            config.secret_key.as_deref(),
            config.customer_id.as_deref(),
        ) else {
            return Err(VolumeError::Config(
                "SearchAd api key, secret key and customer id are required".to_string(),
            ));
        };
        if !config.has_credentials() {
            return Err(VolumeError::Config("SearchAd credentials are empty".to_string()));
        }
        crate::install_crypto_provider();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VolumeError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
            customer_id: customer_id.to_string(),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            clock: Arc::new(RealTimeProvider),
        })
    }

    /// 替换签名使用的时钟。
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    async fn send(&self, hint: &str) -> Result<Response, VolumeError> {
        let timestamp = self.clock.now().timestamp_millis().to_string();
        let signature = sign(&self.secret_key, &timestamp, "GET", KEYWORD_TOOL_URI)?;
        self.client
            .get(format!("{}{}", self.base_url, KEYWORD_TOOL_URI))
            .query(&[("hintKeywords", hint), ("showDetail", "1")])
            .header("X-Timestamp", timestamp)
            .header("X-API-KEY", &self.api_key)
            .header("X-Customer", &self.customer_id)
            .header("X-Signature", signature)
            .send()
            .await
            .map_err(|e| VolumeError::Network(e.to_string()))
    }
}

#[async_trait]
impl VolumeProvider for SearchAdProvider {
    /// # Summary
    /// 查询关键词及其关联关键词最近完整月的检索量。
    ///
    /// # Logic
    /// 1. 签名并发送请求，429 时等待后重签名重试一次。
    /// 2. 401 映射为 `Unauthorized`，429 映射为 `RateLimited`，其他非 2xx 映射为 `Http`。
    /// 3. 逐行解析计数，缺失字段按 0 或空字符串处理。
    async fn keyword_stats(&self, hint: &str) -> Result<Vec<KeywordStat>, VolumeError> {
        let mut resp = self.send(hint).await?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!("SearchAd rate limited, retrying in {:?}", self.retry_delay);
            tokio::time::sleep(self.retry_delay).await;
            resp = self.send(hint).await?;
        }

        match resp.status() {
            StatusCode::UNAUTHORIZED => return Err(VolumeError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(VolumeError::RateLimited),
            status if !status.is_success() => return Err(VolumeError::Http(status.as_u16())),
            _ => {}
        }

        let body: KeywordToolResponse = resp
            .json()
            .await
            .map_err(|e| VolumeError::Parse(e.to_string()))?;
        debug!("SearchAd returned {} keywords for '{}'", body.keyword_list.len(), hint);
        Ok(body.keyword_list.into_iter().map(KeywordStat::from).collect())
    }
}
