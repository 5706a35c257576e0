//! # Flaky Translator
//!
//! 面向一个不稳定翻译后端的客户端库：后端会随机延迟、随机失败，
//! 并在重复请求时永久封禁客户端；客户端在其上提供重试、批量和质量保证。
//!
//! ## 模块组织
//!
//! - `translation` - 外部API、翻译服务、错误与配置
//! - `env` - 类型安全的环境变量访问

pub mod env;
pub mod translation;

pub use translation::*;
