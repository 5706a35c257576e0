//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslatorConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 重试相关
    pub const DEFAULT_MAX_REQUEST_ATTEMPTS: usize = 3;

    // 模拟后端延迟
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(100);
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1);

    // 登记译文时未给出质量时使用的值
    pub const DEFAULT_QUALITY: f64 = 1.0;

    // 后端随机错误码上限
    pub const MAX_ERROR_CODE: u32 = 10_000;

    pub const DEFAULT_LOG_LEVEL: &str = "info";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "flaky-translator.toml",
        ".flaky-translator.toml",
        "~/.config/flaky-translator/config.toml",
        "/etc/flaky-translator/config.toml",
    ];
}
