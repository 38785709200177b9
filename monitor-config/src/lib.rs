use config::{Config, Environment, File, FileFormat};
use monitor_core::{MonitorConfig, MonitorError, Result};
use std::path::Path;
use tracing::info;

pub const ENV_PREFIX: &str = "CRYPTO_MONITOR";

/// Layers built-in defaults, an optional YAML file and `CRYPTO_MONITOR__*`
/// environment variables, in that order of precedence.
pub struct ConfigManager {
    monitor_config: MonitorConfig,
}

impl ConfigManager {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = serde_yaml::to_string(&MonitorConfig::default())
            .map_err(|e| MonitorError::Configuration(e.to_string()))?;

        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Yaml));

        if let Some(path) = path {
            if !path.exists() {
                return Err(MonitorError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MonitorError::Configuration(e.to_string()))?;

        let monitor_config: MonitorConfig = config
            .try_deserialize()
            .map_err(|e| MonitorError::Configuration(e.to_string()))?;

        match path {
            Some(path) => info!("Configuration loaded from {}", path.display()),
            None => info!("Configuration loaded from defaults and environment"),
        }

        Ok(Self { monitor_config })
    }

    pub fn get_config(&self) -> &MonitorConfig {
        &self.monitor_config
    }

    pub fn get_config_mut(&mut self) -> &mut MonitorConfig {
        &mut self.monitor_config
    }

    pub fn into_config(self) -> MonitorConfig {
        self.monitor_config
    }

    pub fn validate(&self) -> Result<()> {
        let exchange = &self.monitor_config.exchange;

        if exchange.base_url.trim().is_empty() {
            return Err(MonitorError::Configuration(
                "Exchange base URL not configured".to_string(),
            ));
        }

        if exchange.quote_currency.trim().is_empty() {
            return Err(MonitorError::Configuration(
                "Quote currency not configured".to_string(),
            ));
        }

        if exchange.top_n == 0 {
            return Err(MonitorError::Configuration(
                "top_n must be at least 1".to_string(),
            ));
        }

        if exchange.candle_count < 2 {
            return Err(MonitorError::Configuration(
                "candle_count must be at least 2".to_string(),
            ));
        }

        if self.monitor_config.indicator.rsi_period == 0 {
            return Err(MonitorError::Configuration(
                "rsi_period must be at least 1".to_string(),
            ));
        }

        info!("Configuration validation passed");
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.monitor_config)
            .map_err(|e| MonitorError::Configuration(e.to_string()))?;

        std::fs::write(path, yaml).map_err(|e| MonitorError::Configuration(e.to_string()))?;

        info!("Configuration saved to file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let manager = ConfigManager::load(None).unwrap();
        let config = manager.get_config();

        assert_eq!(config.exchange.base_url, monitor_core::DEFAULT_BASE_URL);
        assert_eq!(config.exchange.top_n, 30);
        assert_eq!(config.indicator.rsi_period, 14);
        assert!(manager.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_yaml(
            "server:\n  port: 9000\nexchange:\n  quote_currency: BTC\n  request_timeout_secs: 10\n",
        );

        let config = ConfigManager::load(Some(file.path())).unwrap().into_config();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.exchange.quote_currency, "BTC");
        assert_eq!(config.exchange.request_timeout_secs, Some(10));
        assert_eq!(config.exchange.candle_count, 15);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ConfigManager::load(Some(Path::new("/nonexistent/monitor.yaml")))
            .err()
            .unwrap();
        assert!(matches!(err, MonitorError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut manager = ConfigManager::load(None).unwrap();
        manager.get_config_mut().exchange.candle_count = 1;
        assert!(manager.validate().is_err());

        let mut manager = ConfigManager::load(None).unwrap();
        manager.get_config_mut().exchange.top_n = 0;
        assert!(manager.validate().is_err());

        let mut manager = ConfigManager::load(None).unwrap();
        manager.get_config_mut().indicator.rsi_period = 0;
        assert!(manager.validate().is_err());

        let mut manager = ConfigManager::load(None).unwrap();
        manager.get_config_mut().exchange.base_url = " ".to_string();
        assert!(manager.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let mut manager = ConfigManager::load(None).unwrap();
        manager.get_config_mut().exchange.top_n = 10;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.yaml");
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::load(Some(&path)).unwrap();
        assert_eq!(reloaded.get_config().exchange.top_n, 10);
    }
}
