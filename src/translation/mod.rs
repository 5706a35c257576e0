//! 翻译功能模块
//!
//! 包含外部翻译API的能力接口与模拟实现、在其上构建的翻译服务、
//! 统一错误类型以及配置管理。
//!
//! ## 模块组织
//!
//! - `api` - 外部API接口与模拟后端
//! - `service` - 翻译服务（free / batch / request / premium）
//! - `error` - 错误类型
//! - `config` - 配置加载与常量

pub mod api;
pub mod config;
pub mod error;
pub mod service;

// 重新导出主要类型
pub use api::{ExternalApi, MockApiConfig, MockExternalApi, RequestCallback, TranslatableValues, Translation};
pub use config::{ConfigManager, TranslatorConfig};
pub use error::{TranslationError, TranslationResult};
pub use service::{ServiceConfig, ServiceStatsSnapshot, TranslationService};
