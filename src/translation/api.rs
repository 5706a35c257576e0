//! 外部翻译API
//!
//! 定义翻译服务依赖的外部能力接口 [`ExternalApi`]，以及一个模拟实现
//! [`MockExternalApi`]：带随机延迟、会随机失败、并且会因重复请求而永久封禁客户端。

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 一次成功查询得到的译文记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translation: String,
    #[serde(default = "default_quality")]
    pub quality: f64,
}

fn default_quality() -> f64 {
    constants::DEFAULT_QUALITY
}

/// 构造模拟后端用的数据：文本 -> 待消费的结果队列，`None` 表示“暂无译文”
pub type TranslatableValues = HashMap<String, Vec<Option<Translation>>>;

/// `request` 完成时的回调，`None` 表示成功
pub type RequestCallback = Box<dyn FnOnce(Option<TranslationError>) + Send + 'static>;

/// 翻译服务消费的外部能力
///
/// `fetch` 在调用时即确定结果，返回的 future 只负责等待；
/// `request` 通过回调报告结果，只有参数非法时才同步返回错误。
pub trait ExternalApi: Send + Sync {
    fn fetch(&self, text: &str) -> BoxFuture<'static, TranslationResult<Translation>>;

    fn request(&self, text: &str, callback: RequestCallback) -> TranslationResult<()>;
}

/// 模拟后端配置
#[derive(Debug, Clone, PartialEq)]
pub struct MockApiConfig {
    /// `fetch` 随机延迟的上界（不含）
    pub max_delay: Duration,
    /// `request` 回调触发前的延迟
    pub request_delay: Duration,
}

impl Default for MockApiConfig {
    fn default() -> Self {
        Self {
            max_delay: constants::DEFAULT_MAX_DELAY,
            request_delay: constants::DEFAULT_REQUEST_DELAY,
        }
    }
}

type Store = HashMap<String, VecDeque<Option<Translation>>>;

/// 模拟的第三方翻译后端
pub struct MockExternalApi {
    values: Arc<Mutex<Store>>,
    banned: AtomicBool,
    config: MockApiConfig,
}

/// 夹具文件中的一条结果；缺少 `translation` 即为“暂无译文”
#[derive(Debug, Deserialize)]
struct FixtureEntry {
    translation: Option<String>,
    quality: Option<f64>,
}

enum RequestDecision {
    Unknown,
    Abusive,
    Shifted(tokio::runtime::Handle),
}

impl MockExternalApi {
    pub fn new() -> Self {
        Self::with_config(MockApiConfig::default())
    }

    pub fn with_config(config: MockApiConfig) -> Self {
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
            banned: AtomicBool::new(false),
            config,
        }
    }

    /// 从给定数据构造；数据被完整复制，之后对原数据的修改不会影响后端
    pub fn with_values(values: &TranslatableValues) -> Self {
        Self::from_values(values, MockApiConfig::default())
    }

    pub fn from_values(values: &TranslatableValues, config: MockApiConfig) -> Self {
        let store = values
            .iter()
            .map(|(text, outcomes)| (text.clone(), outcomes.iter().cloned().collect()))
            .collect();

        Self {
            values: Arc::new(Mutex::new(store)),
            banned: AtomicBool::new(false),
            config,
        }
    }

    /// 登记一条结果（可链式调用）
    ///
    /// `translation` 为 `None` 或空串时登记“暂无译文”。
    pub fn register(
        self,
        value: impl Into<String>,
        translation: Option<&str>,
        quality: Option<f64>,
    ) -> Self {
        let outcome = match translation {
            Some(translation) if !translation.is_empty() => Some(Translation {
                translation: translation.to_string(),
                quality: quality.unwrap_or(constants::DEFAULT_QUALITY),
            }),
            _ => None,
        };

        lock_store(&self.values)
            .entry(value.into())
            .or_default()
            .push_back(outcome);
        self
    }

    /// 从 JSON 夹具加载，`null` 表示“暂无译文”
    pub fn from_json_str(json: &str, config: MockApiConfig) -> TranslationResult<Self> {
        let fixture: HashMap<String, Vec<Option<FixtureEntry>>> = serde_json::from_str(json)
            .map_err(|e| TranslationError::BadRequest(format!("invalid JSON fixture: {}", e)))?;

        Ok(Self::from_fixture(fixture, config))
    }

    /// 从 TOML 夹具加载，空表 `{}` 表示“暂无译文”
    pub fn from_toml_str(source: &str, config: MockApiConfig) -> TranslationResult<Self> {
        let fixture: HashMap<String, Vec<FixtureEntry>> = toml::from_str(source)
            .map_err(|e| TranslationError::BadRequest(format!("invalid TOML fixture: {}", e)))?;

        let fixture = fixture
            .into_iter()
            .map(|(text, entries)| (text, entries.into_iter().map(Some).collect()))
            .collect();
        Ok(Self::from_fixture(fixture, config))
    }

    /// 按扩展名加载夹具文件（`.json` 或 `.toml`）
    pub fn from_fixture_file<P: AsRef<Path>>(
        path: P,
        config: MockApiConfig,
    ) -> TranslationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::BadRequest(format!("cannot read fixture {}: {}", path.display(), e))
        })?;

        tracing::info!("加载翻译夹具: {}", path.display());
        if path.extension().map_or(false, |ext| ext == "json") {
            Self::from_json_str(&content, config)
        } else {
            Self::from_toml_str(&content, config)
        }
    }

    fn from_fixture(fixture: HashMap<String, Vec<Option<FixtureEntry>>>, config: MockApiConfig) -> Self {
        let mut api = Self::with_config(config);
        for (text, entries) in fixture {
            for entry in entries {
                api = match entry {
                    Some(entry) => api.register(text.clone(), entry.translation.as_deref(), entry.quality),
                    None => api.register(text.clone(), None, None),
                };
            }
        }
        api
    }

    /// 客户端是否已被封禁
    pub fn is_banned(&self) -> bool {
        self.banned.load(Ordering::SeqCst)
    }

    /// 某文本剩余的结果数；`None` 表示从未登记
    pub fn pending(&self, text: &str) -> Option<usize> {
        self.store().get(text).map(VecDeque::len)
    }

    /// 当前数据的副本
    pub fn snapshot(&self) -> TranslatableValues {
        self.store()
            .iter()
            .map(|(text, queue)| (text.clone(), queue.iter().cloned().collect()))
            .collect()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        lock_store(&self.values)
    }

    fn random_delay(&self) -> Duration {
        if self.config.max_delay.is_zero() {
            return Duration::ZERO;
        }
        rand::thread_rng().gen_range(Duration::ZERO..self.config.max_delay)
    }

    fn lookup(&self, text: &str) -> TranslationResult<Translation> {
        if self.is_banned() {
            return Err(TranslationError::AbusiveClient);
        }

        match self.store().get(text) {
            Some(queue) => match queue.front() {
                Some(Some(translation)) => Ok(translation.clone()),
                _ => Err(TranslationError::NotAvailable(text.to_string())),
            },
            None => Err(TranslationError::Untranslatable),
        }
    }
}

impl Default for MockExternalApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalApi for MockExternalApi {
    fn fetch(&self, text: &str) -> BoxFuture<'static, TranslationResult<Translation>> {
        let outcome = self.lookup(text);
        let delay = self.random_delay();

        tracing::debug!(text = %text, ?delay, ok = outcome.is_ok(), "模拟后端 fetch");

        async move {
            sleep(delay).await;
            outcome
        }
        .boxed()
    }

    fn request(&self, text: &str, callback: RequestCallback) -> TranslationResult<()> {
        let runtime = tokio::runtime::Handle::try_current();
        let decision = {
            let mut store = self.store();
            match store.get_mut(text) {
                None => RequestDecision::Unknown,
                Some(queue) if matches!(queue.front(), Some(Some(_))) => RequestDecision::Abusive,
                Some(queue) => {
                    let handle = runtime.map_err(|e| {
                        TranslationError::Internal(format!("request 需要在 tokio 运行时中调用: {}", e))
                    })?;
                    queue.pop_front();
                    RequestDecision::Shifted(handle)
                }
            }
        };

        match decision {
            RequestDecision::Unknown => {
                tracing::debug!(text = %text, "模拟后端 request: 未登记的文本");
                callback(Some(TranslationError::Untranslatable));
            }
            RequestDecision::Abusive => {
                self.banned.store(true, Ordering::SeqCst);
                tracing::warn!(text = %text, "译文已可用时重复请求，客户端被封禁");
                callback(Some(TranslationError::AbusiveClient));
            }
            RequestDecision::Shifted(handle) => {
                let values = Arc::clone(&self.values);
                let delay = self.config.request_delay;
                let text = text.to_string();

                handle.spawn(async move {
                    sleep(delay).await;
                    // 回调触发时才检查队首，与调度期间的其他 request 交错一致
                    let available = matches!(
                        lock_store(&values).get(&text).and_then(VecDeque::front),
                        Some(Some(_))
                    );
                    let error = if available {
                        None
                    } else {
                        Some(random_backend_error())
                    };
                    tracing::debug!(text = %text, ok = error.is_none(), "模拟后端 request 完成");
                    callback(error);
                });
            }
        }

        Ok(())
    }
}

fn lock_store(values: &Mutex<Store>) -> MutexGuard<'_, Store> {
    values.lock().unwrap_or_else(PoisonError::into_inner)
}

fn random_backend_error() -> TranslationError {
    let code = rand::thread_rng().gen_range(1..=constants::MAX_ERROR_CODE);
    TranslationError::Backend(format!("Error code {}", code))
}
