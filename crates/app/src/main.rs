mod cli;
mod logging;
mod settings;

use clap::Parser;
use kwlens_analysis::analyzer::{AnalyzerSettings, KeywordAnalyzer};
use kwlens_analysis::limiter::from_interval_ms;
use kwlens_analysis::volume::VolumeEstimator;
use kwlens_core::common::time::RealTimeProvider;
use kwlens_feed::datalab::DatalabProvider;
use kwlens_feed::searchad::SearchAdProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// 命令行入口，纯粹的 DI 容器。
/// 负责实例化上游适配器并通过 Arc<dyn Trait> 注入到 KeywordAnalyzer。
///
/// # Logic
/// 1. 解析命令行，加载 `.env`，初始化日志。
/// 2. 加载分层配置。
/// 3. 实例化基础设施层 (DataLab、SearchAd、节流器)。
/// 4. 构造分析器并生成报告。
/// 5. 报告以 JSON 输出到 stdout。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 命令行与日志
    let cli = cli::Cli::parse();
    let dotenv = dotenvy::dotenv();
    let _guard = logging::init(cli.log_dir.as_deref())?;
    if let Err(e) = dotenv {
        debug!("No .env loaded: {}", e);
    }
    info!("kwlens starting for '{}'", cli.keyword);

    // 2. 配置
    let config = settings::load(cli.config.as_deref())?;

    // 3. 基础设施层
    kwlens_feed::install_crypto_provider();
    let trends = Arc::new(DatalabProvider::new(&config.datalab)?);
    let limiter = from_interval_ms(config.analysis.call_interval_ms);

    // 4. 分析器
    let mut estimator = VolumeEstimator::new();
    if let Some(period) = &cli.reference_period {
        estimator = estimator.with_reference_period(period.clone());
    }
    let mut analyzer = KeywordAnalyzer::new(trends, limiter, Arc::new(RealTimeProvider))
        .with_settings(AnalyzerSettings::from(&config.analysis))
        .with_estimator(estimator);
    if config.searchad.has_credentials() {
        analyzer = analyzer.with_volume_provider(Arc::new(SearchAdProvider::new(&config.searchad)?));
    } else {
        warn!("SearchAd credentials missing, volume and related keywords are unavailable");
    }

    let report = analyzer.analyze_sections(&cli.keyword, &cli.sections()).await;

    // 5. 输出
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    info!("kwlens finished with {} notes", report.notes.len());

    Ok(())
}
