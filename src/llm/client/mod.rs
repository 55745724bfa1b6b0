//! LLM客户端 - 基于rig提供统一的语言模型服务接口

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::llm::{GenerationRequest, LanguageModel};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::{classify_provider_error, evaluate_befitting_model};

/// LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    fn service_name(&self) -> String {
        format!("llm/{}", self.config.provider)
    }

    /// 通用重试逻辑，只重试上游错误与限流错误
    async fn retry_with_backoff<T, F, Fut>(&self, log_tag: &str, operation: F) -> PlannerResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = PlannerResult<T>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    if !err.is_retryable() || retries >= max_retries {
                        return Err(err);
                    }
                    let delay = err.retry_after().unwrap_or(retry_delay);
                    eprintln!(
                        "❌ [{}] 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        log_tag, retries, max_retries, err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// 单次调用，带超时
    async fn prompt_once(
        &self,
        model: &str,
        preamble: &str,
        user_prompt: &str,
    ) -> PlannerResult<String> {
        let agent = self
            .client
            .create_agent(model, preamble, &self.config)
            .map_err(|e| PlannerError::upstream(self.service_name(), e))?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        match tokio::time::timeout(timeout, agent.prompt(user_prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(classify_provider_error(&self.service_name(), &e.to_string())),
            Err(_) => Err(PlannerError::upstream(
                self.service_name(),
                format!("调用超时 ({:?})", timeout),
            )),
        }
    }

    async fn generate_with_model(
        &self,
        request: &GenerationRequest,
        user_prompt: &str,
        model: &str,
    ) -> PlannerResult<String> {
        debug!(target: "llm", tag = %request.log_tag, model = %model, prompt_len = user_prompt.len(), "sending prompt");
        let preamble = request.preamble.as_str();
        self.retry_with_backoff(&request.log_tag, || async move {
            self.prompt_once(model, preamble, user_prompt).await
        })
        .await
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn generate(&self, request: &GenerationRequest) -> PlannerResult<String> {
        let user_prompt = request.render_user_prompt();
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, &request.preamble, &user_prompt);

        match self
            .generate_with_model(request, &user_prompt, &befitting_model)
            .await
        {
            Ok(text) => Ok(text),
            Err(err) if err.is_retryable() => match fallover_model {
                Some(model) => {
                    warn!(target: "llm", tag = %request.log_tag, error = %err, fallover = %model, "efficient model exhausted, switching model");
                    eprintln!(
                        "❌ 调用模型服务出错，尝试 {} 次均失败，尝试使用备选模型{}...{}",
                        self.config.retry_attempts, model, err
                    );
                    self.generate_with_model(request, &user_prompt, &model).await
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// 检查模型连接和功能是否正常
    async fn check_connection(&self) -> PlannerResult<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt_once(
                &self.config.model_efficient,
                "You are a helpful assistant.",
                "Hello",
            )
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client_with(retry_attempts: u32, retry_delay_ms: u64) -> LLMClient {
        LLMClient::new(LLMConfig {
            api_key: "test-key".to_string(),
            retry_attempts,
            retry_delay_ms,
            ..LLMConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_retry_stops_after_configured_attempts() {
        let client = client_with(3, 1);
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let result: PlannerResult<String> = client
            .retry_with_backoff("test", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PlannerError::upstream("llm/test", "503 Service Unavailable"))
            })
            .await;

        assert!(matches!(result, Err(PlannerError::UpstreamService { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let client = client_with(3, 1);
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let result = client
            .retry_with_backoff("test", move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(PlannerError::upstream("llm/test", "connection reset"))
                } else {
                    Ok("day plan".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap(), "day plan");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_retried() {
        let client = client_with(3, 1);
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let result: PlannerResult<String> = client
            .retry_with_backoff("test", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PlannerError::empty("Synthesizer"))
            })
            .await;

        assert!(matches!(result, Err(PlannerError::EmptyResult { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_uses_retry_after_delay() {
        // 配置的间隔为30秒，只有采用retry_after才能在超时内完成
        let client = client_with(2, 30_000);
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.retry_with_backoff("test", move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PlannerError::RateLimit {
                        service: "llm/test".to_string(),
                        retry_after: Some(Duration::from_millis(5)),
                    })
                } else {
                    Ok("ok".to_string())
                }
            }),
        )
        .await
        .expect("retry_after should replace the configured delay");

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
