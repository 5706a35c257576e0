// 集成测试公共模块
//
// 提供快速的模拟后端构造器，以及一个按脚本返回结果、记录调用次数的外部API

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use flaky_translator::translation::{
    ExternalApi, MockApiConfig, MockExternalApi, RequestCallback, Translation, TranslationError,
    TranslationResult,
};

/// 测试用的短延迟配置
pub fn fast_config() -> MockApiConfig {
    MockApiConfig {
        max_delay: Duration::from_millis(5),
        request_delay: Duration::from_millis(1),
    }
}

/// 空的快速模拟后端
pub fn fast_mock() -> MockExternalApi {
    MockExternalApi::with_config(fast_config())
}

/// "lo" 先无译文、之后有一条质量 0.5 的译文
pub fn lo_mock() -> MockExternalApi {
    fast_mock()
        .register("lo", None, None)
        .register("lo", Some("low"), Some(0.5))
}

pub fn record(translation: &str, quality: f64) -> Translation {
    Translation {
        translation: translation.to_string(),
        quality,
    }
}

/// 脚本化 request 的一步
#[derive(Debug, Clone)]
pub enum RequestStep {
    /// 回调报告成功
    Succeed,
    /// 回调报告错误
    Fail(TranslationError),
    /// 同步返回错误，不调用回调
    Reject(TranslationError),
    /// 丢弃回调
    Drop,
}

/// 按脚本返回结果的外部API
///
/// fetch 脚本按文本消费，用完后返回 `Untranslatable`；
/// request 脚本全局消费，用完后回调报告后端错误。
#[derive(Default)]
pub struct ScriptedApi {
    fetches: Mutex<HashMap<String, VecDeque<TranslationResult<Translation>>>>,
    requests: Mutex<VecDeque<RequestStep>>,
    pub fetch_calls: AtomicUsize,
    pub request_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetch(self, text: &str, result: TranslationResult<Translation>) -> Self {
        self.fetches
            .lock()
            .unwrap()
            .entry(text.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn on_request(self, step: RequestStep) -> Self {
        self.requests.lock().unwrap().push_back(step);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }
}

impl ExternalApi for ScriptedApi {
    fn fetch(&self, text: &str) -> BoxFuture<'static, TranslationResult<Translation>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .fetches
            .lock()
            .unwrap()
            .get_mut(text)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(TranslationError::Untranslatable));

        async move {
            tokio::task::yield_now().await;
            result
        }
        .boxed()
    }

    fn request(&self, _text: &str, callback: RequestCallback) -> TranslationResult<()> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .requests
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RequestStep::Fail(TranslationError::Backend("script exhausted".to_string())));

        match step {
            RequestStep::Succeed => callback(None),
            RequestStep::Fail(error) => callback(Some(error)),
            RequestStep::Reject(error) => return Err(error),
            RequestStep::Drop => drop(callback),
        }
        Ok(())
    }
}
