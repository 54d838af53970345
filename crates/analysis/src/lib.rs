//! # `kwlens-analysis` - 对齐与估算引擎
//!
//! 上游平台对每次查询独立归一化 (各自的最大值重置为 100)，不同查询之间的比例值不可直接比较。
//! 本 crate 通过"同窗口求和"建立统一的比较基准，把多个分段查询换算为可比的百分比占比，
//! 并用外部提供的绝对检索量锚点把相对趋势换算为绝对检索量。
//!
//! ## 组件
//! - `window`: 截止到昨天的查询窗口
//! - `limiter`: 基于 `governor` 的固定间隔节流器
//! - `catalog`: 各维度的分段定义表
//! - `extractor`: 从原始响应中提取比例和或数据点序列
//! - `fanout`: 按分段逐一查询，失败分段记为 0 并保留原因
//! - `buckets`: 细分年龄代码到粗粒度年龄段的汇总
//! - `normalizer`: 按设备分组独立计算百分比
//! - `trend`: 月粒度趋势查询
//! - `volume`: 锚点选择与绝对量换算
//! - `analyzer`: 面向调用方的门面

pub mod analyzer;
pub mod buckets;
pub mod catalog;
pub mod extractor;
pub mod fanout;
pub mod limiter;
pub mod normalizer;
pub mod trend;
pub mod volume;
pub mod window;
