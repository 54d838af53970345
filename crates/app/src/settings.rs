use config::{Config, ConfigError, Environment, File};
use kwlens_core::config::AppConfig;
use std::path::Path;

/// 环境变量前缀，如 `KWLENS__DATALAB__CLIENT_ID`。
const ENV_PREFIX: &str = "KWLENS";

/// 未指定配置文件时尝试读取的默认文件名 (不含扩展名)。
const DEFAULT_CONFIG_NAME: &str = "kwlens";

/// # Summary
/// 加载分层配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为最底层。
/// 2. 叠加配置文件：显式指定时必须存在，否则尝试可选的 `kwlens.*`。
/// 3. 叠加 `KWLENS__SECTION__KEY` 环境变量。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with_env(path, environment())
}

fn environment() -> Environment {
    // 不做类型推断，数字形式的凭证保持原样 (如前导 0)
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(source))
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = load_with_env(None, env(&[])).unwrap();
        assert_eq!(config.analysis.call_interval_ms, 50);
        assert_eq!(config.datalab.timeout_secs, 10);
        assert!(config.datalab.client_id.is_none());
    }

    #[test]
    fn test_file_then_env_layering() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[datalab]\nclient_id = \"from-file\"\nclient_secret = \"s\"\n\n[analysis]\ncall_interval_ms = 200"
        )
        .unwrap();

        let config = load_with_env(
            Some(file.path()),
            env(&[
                ("KWLENS__ANALYSIS__CALL_INTERVAL_MS", "75"),
                ("KWLENS__SEARCHAD__CUSTOMER_ID", "12345"),
            ]),
        )
        .unwrap();
        assert_eq!(config.datalab.client_id.as_deref(), Some("from-file"));
        assert_eq!(config.analysis.call_interval_ms, 75);
        assert_eq!(config.searchad.customer_id.as_deref(), Some("12345"));
        assert_eq!(config.analysis.trend_window_days, 365);
    }

    #[test]
    fn test_numeric_credentials_stay_verbatim() {
        let config = load_with_env(
            None,
            env(&[
                ("KWLENS__SEARCHAD__CUSTOMER_ID", "0123"),
                ("KWLENS__DATALAB__CLIENT_SECRET", "00042"),
                ("KWLENS__ANALYSIS__PROPORTION_TOLERANCE", "0.25"),
            ]),
        )
        .unwrap();
        assert_eq!(config.searchad.customer_id.as_deref(), Some("0123"));
        assert_eq!(config.datalab.client_secret.as_deref(), Some("00042"));
        assert_eq!(config.analysis.proportion_tolerance, 0.25);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = load_with_env(Some(Path::new("/nonexistent/kwlens.toml")), env(&[]));
        assert!(result.is_err());
    }
}
