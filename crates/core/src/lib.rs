//! # `kwlens-core` - 领域核心
//!
//! 本 crate 定义关键词趋势分析系统的领域实体、错误枚举与端口 (Port) 契约。
//! 上游数据源 (DataLab 趋势、SearchAd 关键词工具) 的具体实现位于 `kwlens-feed`，
//! 对齐与估算算法位于 `kwlens-analysis`。
//!
//! ## 模块划分
//! - `common`: 设备、性别、年龄代码、时间粒度等共享枚举，以及可替换的时钟
//! - `trend`: 相对比例序列的查询、原始响应与 `TrendProvider` 端口
//! - `volume`: 绝对检索量锚点、估算结果与 `VolumeProvider` 端口
//! - `analysis`: 分段标量、占比与分析错误
//! - `limiter`: 上游调用节流端口
//! - `config`: 全局应用配置

pub mod analysis;
pub mod common;
pub mod config;
pub mod limiter;
pub mod trend;
pub mod volume;

#[cfg(feature = "test-utils")]
pub mod testing;
