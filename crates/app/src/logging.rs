use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "kwlens.log";

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. 过滤级别取自 `RUST_LOG`，缺省为 `info`。
/// 2. 日志写到 stderr，stdout 只输出报告 JSON。
/// 3. 指定目录时额外写入按天滚动的日志文件。
///
/// # Returns
/// 文件日志的后台写入守卫，必须持有到进程退出。
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}
