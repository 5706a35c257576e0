//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::api::MockApiConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::service::ServiceConfig;

/// 翻译客户端配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorConfig {
    // 客户端配置
    pub max_request_attempts: usize,

    // 模拟后端配置
    pub max_delay_ms: u64,
    pub request_delay_ms: u64,

    // 日志
    pub log_level: String,
}

impl TranslatorConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_request_attempts == 0 {
            return Err(TranslationError::ConfigError(
                "request 尝试次数不能为0".to_string(),
            ));
        }

        if self.max_delay_ms == 0 {
            return Err(TranslationError::ConfigError(
                "最大延迟必须大于0毫秒".to_string(),
            ));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> TranslationResult<()> {
        use crate::env::{logging, translator, EnvVar};

        if let Some(attempts) = translator::MaxRequestAttempts::get_explicit() {
            self.max_request_attempts =
                attempts.map_err(|e| TranslationError::ConfigError(e.to_string()))?;
            tracing::info!("环境变量覆盖 request 尝试次数: {}", self.max_request_attempts);
        }

        if let Some(delay) = translator::MaxDelay::get_explicit() {
            let delay = delay.map_err(|e| TranslationError::ConfigError(e.to_string()))?;
            self.max_delay_ms = delay.as_millis() as u64;
        }

        if let Some(delay) = translator::RequestDelay::get_explicit() {
            let delay = delay.map_err(|e| TranslationError::ConfigError(e.to_string()))?;
            self.request_delay_ms = delay.as_millis() as u64;
        }

        if let Some(level) = logging::LogLevel::get_explicit() {
            self.log_level = level.map_err(|e| TranslationError::ConfigError(e.to_string()))?;
        }

        Ok(())
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 客户端部分的配置
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_request_attempts: self.max_request_attempts,
        }
    }

    /// 模拟后端部分的配置
    pub fn mock_config(&self) -> MockApiConfig {
        MockApiConfig {
            max_delay: self.max_delay(),
            request_delay: self.request_delay(),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            max_request_attempts: constants::DEFAULT_MAX_REQUEST_ATTEMPTS,
            max_delay_ms: constants::DEFAULT_MAX_DELAY.as_millis() as u64,
            request_delay_ms: constants::DEFAULT_REQUEST_DELAY.as_millis() as u64,
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslatorConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按搜索路径加载配置，再叠加环境变量
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                let config = Self::load_from_file(candidate)?;
                return Self::finish(config, Some(candidate.to_path_buf()));
            }
        }

        Self::finish(TranslatorConfig::default(), None)
    }

    /// 从指定文件加载配置，再叠加环境变量
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        Self::load_dotenv();
        let config = Self::load_from_file(path.as_ref())?;
        Self::finish(config, Some(path.as_ref().to_path_buf()))
    }

    fn finish(mut config: TranslatorConfig, source: Option<PathBuf>) -> TranslationResult<Self> {
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 配置来自哪个文件；`None` 表示使用默认配置
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 从指定文件加载配置，按扩展名选择 TOML 或 JSON
    pub fn load_from_file(path: &Path) -> TranslationResult<TranslatorConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ConfigError(format!("读取配置文件 {} 失败: {}", path.display(), e))
        })?;

        if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> TranslationResult<()> {
        let config = TranslatorConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_request_attempts, 3);
        assert_eq!(config.max_delay(), Duration::from_millis(100));
        assert_eq!(config.request_delay(), Duration::from_millis(1));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = TranslatorConfig {
            max_request_attempts: 0,
            ..TranslatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TranslationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_delay_ms = 5").unwrap();

        let config = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_delay_ms, 5);
        assert_eq!(config.max_request_attempts, 3);
    }

    #[test]
    fn test_json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"max_request_attempts": 5, "request_delay_ms": 0}}"#).unwrap();

        let config = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_request_attempts, 5);
        assert_eq!(config.request_delay(), Duration::ZERO);
    }

    #[test]
    fn test_from_file_records_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_request_attempts = 4").unwrap();

        let manager = ConfigManager::from_file(file.path()).unwrap();
        assert_eq!(manager.source(), Some(file.path()));
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_delay_ms = \"soon\"").unwrap();

        let result = ConfigManager::load_from_file(file.path());
        assert!(matches!(result, Err(TranslationError::ConfigError(_))));
    }

    #[test]
    fn test_generate_example_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.toml");

        ConfigManager::generate_example_config(&path).unwrap();
        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(loaded, TranslatorConfig::default());
    }

    #[test]
    fn test_split_into_component_configs() {
        let config = TranslatorConfig {
            max_request_attempts: 4,
            max_delay_ms: 7,
            request_delay_ms: 2,
            ..TranslatorConfig::default()
        };
        assert_eq!(config.service_config().max_request_attempts, 4);
        assert_eq!(config.mock_config().max_delay, Duration::from_millis(7));
        assert_eq!(config.mock_config().request_delay, Duration::from_millis(2));
    }
}
