//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 只在变量被显式设置时返回值，未设置时沿用配置文件或默认配置
    fn get_explicit() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod logging {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "FLAKY_LOG_LEVEL";
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译客户端与模拟后端相关环境变量
pub mod translator {
    use super::*;

    /// request 的最大尝试次数
    pub struct MaxRequestAttempts;
    impl EnvVar<usize> for MaxRequestAttempts {
        const NAME: &'static str = "FLAKY_MAX_REQUEST_ATTEMPTS";
        const DESCRIPTION: &'static str = "Total attempts made by request() before giving up";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 模拟后端的最大随机延迟
    pub struct MaxDelay;
    impl EnvVar<Duration> for MaxDelay {
        const NAME: &'static str = "FLAKY_MAX_DELAY_MS";
        const DESCRIPTION: &'static str = "Upper bound (exclusive) of the simulated fetch latency in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 1, 60_000)
        }
    }

    /// request 回调的延迟
    pub struct RequestDelay;
    impl EnvVar<Duration> for RequestDelay {
        const NAME: &'static str = "FLAKY_REQUEST_DELAY_MS";
        const DESCRIPTION: &'static str = "Delay before a request() callback fires, in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 60_000)
        }
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min || millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is outside {}..={}", millis, min, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 列出所有已知的环境变量（名称, 说明）
pub fn describe_all() -> Vec<(&'static str, &'static str)> {
    vec![
        (logging::LogLevel::NAME, logging::LogLevel::DESCRIPTION),
        (
            translator::MaxRequestAttempts::NAME,
            translator::MaxRequestAttempts::DESCRIPTION,
        ),
        (translator::MaxDelay::NAME, translator::MaxDelay::DESCRIPTION),
        (
            translator::RequestDelay::NAME,
            translator::RequestDelay::DESCRIPTION,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(logging::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(logging::LogLevel::parse("warn").unwrap(), "warn");
        assert!(logging::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_attempts_validation() {
        assert_eq!(translator::MaxRequestAttempts::parse("3").unwrap(), 3);
        assert_eq!(translator::MaxRequestAttempts::parse(" 5 ").unwrap(), 5);

        // 至少一次尝试
        assert!(translator::MaxRequestAttempts::parse("0").is_err());
        assert!(translator::MaxRequestAttempts::parse("-1").is_err());
        assert!(translator::MaxRequestAttempts::parse("many").is_err());
    }

    #[test]
    fn test_delay_validation() {
        assert_eq!(
            translator::MaxDelay::parse("100").unwrap(),
            Duration::from_millis(100)
        );
        assert!(translator::MaxDelay::parse("0").is_err());
        assert_eq!(
            translator::RequestDelay::parse("0").unwrap(),
            Duration::ZERO
        );
        assert!(translator::RequestDelay::parse("999999").is_err());
    }

    #[test]
    fn test_describe_all_lists_every_variable() {
        let names: Vec<_> = describe_all().into_iter().map(|(name, _)| name).collect();
        assert!(names.contains(&"FLAKY_MAX_REQUEST_ATTEMPTS"));
        assert!(names.contains(&"FLAKY_LOG_LEVEL"));
        assert_eq!(names.len(), 4);
    }
}
