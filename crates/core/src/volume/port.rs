use crate::volume::entity::KeywordStat;
use crate::volume::error::VolumeError;
use async_trait::async_trait;

/// # Summary
/// 绝对检索量数据源接口。
///
/// # Invariants
/// - 上游只报告最近一个完整月的绝对值。
#[async_trait]
pub trait VolumeProvider: Send + Sync {
    /// # Summary
    /// 以提示词查询关联关键词及其月检索量。
    ///
    /// # Logic
    /// 1. 构建带签名的请求。
    /// 2. 解析关键词列表并规整计数字段。
    ///
    /// # Arguments
    /// * `hint`: 提示关键词。
    ///
    /// # Returns
    /// 成功返回关键词统计列表 (顺序与上游一致)，失败返回 `VolumeError`。
    async fn keyword_stats(&self, hint: &str) -> Result<Vec<KeywordStat>, VolumeError>;
}
