//! 翻译服务核心实现
//!
//! 在 [`ExternalApi`] 之上提供四种翻译方式：
//!
//! - `free`: 直接取回译文，不重试、不检查质量
//! - `batch`: 并发翻译一组文本，全部成功或整体失败
//! - `request`: 请求后端生成译文，失败时有限次重试
//! - `premium`: 保证译文质量不低于给定阈值，必要时先请求生成再取回
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use flaky_translator::translation::{MockExternalApi, TranslationService};
//!
//! # async fn demo() -> flaky_translator::translation::TranslationResult<()> {
//! let api = MockExternalApi::new().register("hi", Some("hello"), Some(0.9));
//! let service = TranslationService::new(api);
//!
//! assert_eq!(service.free("hi").await?, "hello");
//! assert_eq!(service.premium("hi", 0.5).await?, "hello");
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::oneshot;

use crate::translation::api::{ExternalApi, Translation};
use crate::translation::config::constants;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 客户端配置
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// `request` 的总尝试次数（含第一次）
    pub max_request_attempts: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_request_attempts: constants::DEFAULT_MAX_REQUEST_ATTEMPTS,
        }
    }
}

/// 翻译服务
///
/// 持有外部API的共享引用。所有失败都原样交给调用方，
/// 只有 `request` 会在用完重试次数后才返回最后一次的错误。
pub struct TranslationService<A: ExternalApi + ?Sized> {
    api: Arc<A>,
    config: ServiceConfig,
    stats: ServiceStats,
}

impl<A: ExternalApi> TranslationService<A> {
    /// 使用默认配置创建服务
    pub fn new(api: A) -> Self {
        Self::with_config(api, ServiceConfig::default())
    }

    pub fn with_config(api: A, config: ServiceConfig) -> Self {
        Self::from_arc(Arc::new(api), config)
    }
}

impl<A: ExternalApi + ?Sized> TranslationService<A> {
    /// 与其他持有者共享同一个外部API
    pub fn from_arc(api: Arc<A>, config: ServiceConfig) -> Self {
        Self {
            api,
            config,
            stats: ServiceStats::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// 获取统计信息快照
    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.stats.snapshot()
    }

    /// 取回译文，不论质量；外部API的错误原样返回
    pub async fn free(&self, text: &str) -> TranslationResult<String> {
        self.fetch(text).await.map(|record| record.translation)
    }

    /// 并发翻译一组文本
    ///
    /// 结果顺序与输入一致。空输入直接返回 `BatchIsEmpty`，不会调用外部API；
    /// 任一文本失败时整体以最先观察到的错误失败。
    pub async fn batch<S: AsRef<str>>(&self, texts: &[S]) -> TranslationResult<Vec<String>> {
        if texts.is_empty() {
            return Err(TranslationError::BatchIsEmpty);
        }

        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("批量翻译 {} 个文本", texts.len());

        try_join_all(texts.iter().map(|text| self.free(text.as_ref()))).await
    }

    /// 请求后端为 `text` 生成译文
    ///
    /// 后端不稳定，最多尝试 `max_request_attempts` 次；
    /// 中间的失败被吞掉，全部失败时返回最后一次的错误。
    pub async fn request(&self, text: &str) -> TranslationResult<()> {
        let max_attempts = self.config.max_request_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.stats.request_attempts.fetch_add(1, Ordering::Relaxed);
            if attempt > 1 {
                self.stats.request_retries.fetch_add(1, Ordering::Relaxed);
            }

            match self.request_once(text).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!("request \"{}\" 在第 {} 次尝试后成功", text, attempt);
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            retryable = e.is_retryable(),
                            "request \"{}\" 第 {}/{} 次失败，重试: {}",
                            text,
                            attempt,
                            max_attempts,
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        helpers::log_error(last_error.unwrap_or_else(|| {
            TranslationError::Internal(format!("request \"{}\" 没有进行任何尝试", text))
        }))
    }

    /// 取回质量不低于 `minimum_quality` 的译文
    ///
    /// 首次取回失败时先 `request` 再取回一次，这两步的错误原样返回。
    pub async fn premium(&self, text: &str, minimum_quality: f64) -> TranslationResult<String> {
        let record = match self.fetch(text).await {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("premium \"{}\" 首次取回失败，请求生成译文: {}", text, e);
                self.request(text).await?;
                self.fetch(text).await?
            }
        };

        if record.quality < minimum_quality {
            self.stats.quality_rejections.fetch_add(1, Ordering::Relaxed);
            return Err(TranslationError::QualityThresholdNotMet(text.to_string()));
        }

        Ok(record.translation)
    }

    async fn fetch(&self, text: &str) -> TranslationResult<Translation> {
        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        self.api.fetch(text).await
    }

    /// 把回调式的 `request` 包装成可等待的单次尝试
    async fn request_once(&self, text: &str) -> TranslationResult<()> {
        let (tx, rx) = oneshot::channel();

        self.api.request(
            text,
            Box::new(move |error| {
                // 接收端已放弃时无需处理
                let _ = tx.send(error);
            }),
        )?;

        match rx.await {
            Ok(None) => Ok(()),
            Ok(Some(error)) => Err(error),
            Err(_) => Err(TranslationError::Internal(format!(
                "request \"{}\" 的回调未被调用",
                text
            ))),
        }
    }
}

/// 服务统计信息
///
/// 使用原子计数器，`&self` 即可更新。
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 对外部API的 fetch 调用次数
    pub fetches: AtomicUsize,

    /// 对外部API的 request 调用次数（含重试）
    pub request_attempts: AtomicUsize,

    /// 其中属于重试的次数
    pub request_retries: AtomicUsize,

    /// 非空批次数量
    pub batches: AtomicUsize,

    /// 因质量不达标而拒绝的次数
    pub quality_rejections: AtomicUsize,
}

impl ServiceStats {
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            fetches: self.fetches.load(Ordering::Relaxed),
            request_attempts: self.request_attempts.load(Ordering::Relaxed),
            request_retries: self.request_retries.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            quality_rejections: self.quality_rejections.load(Ordering::Relaxed),
        }
    }
}

/// 统计信息快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub fetches: usize,
    pub request_attempts: usize,
    pub request_retries: usize,
    pub batches: usize,
    pub quality_rejections: usize,
}
