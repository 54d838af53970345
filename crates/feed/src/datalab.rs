use async_trait::async_trait;
use kwlens_core::config::DatalabConfig;
use kwlens_core::trend::entity::{SeriesResponse, TrendQuery};
use kwlens_core::trend::error::TrendError;
use kwlens_core::trend::port::TrendProvider;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// DataLab 搜索趋势接口的请求体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatalabRequest<'a> {
    start_date: String,
    end_date: String,
    time_unit: String,
    keyword_groups: Vec<KeywordGroup<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ages: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordGroup<'a> {
    group_name: &'a str,
    keywords: Vec<&'a str>,
}

impl<'a> DatalabRequest<'a> {
    fn from_query(query: &'a TrendQuery) -> Self {
        Self {
            start_date: query.start.format("%Y-%m-%d").to_string(),
            end_date: query.end.format("%Y-%m-%d").to_string(),
            time_unit: query.time_unit.to_string(),
            keyword_groups: vec![KeywordGroup {
                group_name: &query.keyword,
                keywords: vec![&query.keyword],
            }],
            device: query.filter.device.map(|d| d.code()),
            gender: query.filter.gender.map(|g| g.code()),
            ages: query.filter.ages.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// # Summary
/// Naver DataLab 搜索趋势数据源。
///
/// # Invariants
/// - 每次查询只发送一个关键词组，组名与关键词相同。
/// - 超时由 HTTP 客户端统一控制，超时与连接失败都映射为 `TrendError::Network`。
#[derive(Clone)]
pub struct DatalabProvider {
    client: Client,
    url: String,
    client_id: String,
    client_secret: String,
}

impl DatalabProvider {
    /// # Summary
    /// 按配置创建数据源。
    ///
    /// # Logic
    /// 1. 校验 Client ID 与 Secret 均已配置。
    /// 2. 以配置的超时构建 HTTP 客户端。
    ///
    /// # Returns
    /// 凭证缺失或客户端构建失败时返回 `TrendError::Config`。
    pub fn new(config: &DatalabConfig) -> Result<Self, TrendError> {
        let (Some(client_id), Some(client_secret)) = (
            non_empty(config.client_id.as_deref()),
            non_empty(config.client_secret.as_deref()),
        ) else {
            return Err(TrendError::Config(
                "DataLab client id and secret are required".to_string(),
            ));
        };
        crate::install_crypto_provider();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrendError::Config(e.to_string()))?;
        Ok(Self::with_client(&config.url, client_id, client_secret, client))
    }

    /// 使用外部构建的客户端创建数据源。
    pub fn with_client(url: &str, client_id: &str, client_secret: &str, client: Client) -> Self {
        Self {
            client,
            url: url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl TrendProvider for DatalabProvider {
    /// # Summary
    /// 发起一次搜索趋势查询。
    ///
    /// # Logic
    /// 1. 把查询转换为 DataLab 请求体 (设备、性别、年龄过滤按需附加)。
    /// 2. 401 映射为 `Unauthorized`，429 映射为 `RateLimited`，其他非 2xx 映射为 `Http`。
    /// 3. 响应体无法解码时返回 `Parse`。
    async fn query(&self, query: &TrendQuery) -> Result<SeriesResponse, TrendError> {
        let body = DatalabRequest::from_query(query);
        debug!("DataLab request: {:?}", body);

        let resp = self
            .client
            .post(&self.url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| TrendError::Network(e.to_string()))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => return Err(TrendError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(TrendError::RateLimited),
            status if !status.is_success() => return Err(TrendError::Http(status.as_u16())),
            _ => {}
        }

        resp.json::<SeriesResponse>()
            .await
            .map_err(|e| TrendError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kwlens_core::common::{AgeCode, Device, Gender, TimeUnit};
    use kwlens_core::trend::entity::SegmentFilter;

    #[test]
    fn test_request_body_shape() {
        let query = TrendQuery {
            keyword: "coffee".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            time_unit: TimeUnit::Date,
            filter: SegmentFilter::ages([AgeCode::new(5).unwrap(), AgeCode::new(6).unwrap()])
                .with_device(Device::Mobile),
        };
        let body = serde_json::to_value(DatalabRequest::from_query(&query)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "startDate": "2025-01-01",
                "endDate": "2025-01-31",
                "timeUnit": "date",
                "keywordGroups": [{"groupName": "coffee", "keywords": ["coffee"]}],
                "device": "mo",
                "ages": ["5", "6"]
            })
        );

        let query = TrendQuery {
            filter: SegmentFilter::gender(Gender::Female),
            time_unit: TimeUnit::Month,
            ..query
        };
        let body = serde_json::to_value(DatalabRequest::from_query(&query)).unwrap();
        assert_eq!(body["gender"], "f");
        assert_eq!(body["timeUnit"], "month");
        assert!(body.get("device").is_none());
        assert!(body.get("ages").is_none());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = DatalabConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("  ".to_string()),
            ..DatalabConfig::default()
        };
        assert!(matches!(DatalabProvider::new(&config), Err(TrendError::Config(_))));
    }
}
