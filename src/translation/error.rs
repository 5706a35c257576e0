//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。调用方通过变体区分失败原因，
//! 而不是依赖错误消息。

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 调用外部API时传入了格式错误的参数
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 客户端已被封禁，之后的所有调用都会以此失败
    #[error("Your client has been rejected because of abusive behaviour.\n\nnaDevvo’ yIghoS!")]
    AbusiveClient,

    /// 文本已登记，但当前没有可用的译文
    #[error("The requested text \"{0}\" has not been translated yet.")]
    NotAvailable(String),

    /// 文本从未登记过
    #[error("jIyajbe’")]
    Untranslatable,

    /// 拿到了译文，但质量低于要求
    #[error("The translation of {0} does not meet the requested quality threshold.")]
    QualityThresholdNotMet(String),

    /// 批量翻译时没有给出任何文本
    #[error("Requested a batch translation, but there are no texts in the batch.")]
    BatchIsEmpty,

    /// 后端随机产生的瞬时错误
    #[error("{0}")]
    Backend(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Backend(_) => true,
            TranslationError::NotAvailable(_) => true,
            TranslationError::Internal(_) => true,
            TranslationError::AbusiveClient => false, // 永久封禁
            TranslationError::BadRequest(_) => false,
            TranslationError::Untranslatable => false,
            TranslationError::QualityThresholdNotMet(_) => false,
            TranslationError::BatchIsEmpty => false,
            TranslationError::ConfigError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::BadRequest(_) => ErrorSeverity::Error,
            TranslationError::AbusiveClient => ErrorSeverity::Critical,
            TranslationError::NotAvailable(_) => ErrorSeverity::Info,
            TranslationError::Untranslatable => ErrorSeverity::Info,
            TranslationError::QualityThresholdNotMet(_) => ErrorSeverity::Info,
            TranslationError::BatchIsEmpty => ErrorSeverity::Info,
            TranslationError::Backend(_) => ErrorSeverity::Warning,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::Internal(_) => ErrorSeverity::Error,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_text() {
        let err = TranslationError::NotAvailable("lo".to_string());
        assert_eq!(
            err.to_string(),
            "The requested text \"lo\" has not been translated yet."
        );

        let err = TranslationError::QualityThresholdNotMet("lo".to_string());
        assert!(err.to_string().contains("lo"));
        assert_eq!(TranslationError::Untranslatable.to_string(), "jIyajbe’");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TranslationError::Backend("Error code 42".to_string()).is_retryable());
        assert!(!TranslationError::AbusiveClient.is_retryable());
        assert!(!TranslationError::BatchIsEmpty.is_retryable());
        assert_eq!(
            TranslationError::AbusiveClient.severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_log_error_returns_same_error() {
        let result: TranslationResult<()> = helpers::log_error(TranslationError::Untranslatable);
        assert_eq!(result, Err(TranslationError::Untranslatable));
    }
}
