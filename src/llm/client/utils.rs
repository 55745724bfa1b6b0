use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::{config::LLMConfig, error::PlannerError};

/// 超过该长度的提示词直接交给高质量模型
const EFFICIENT_MODEL_PROMPT_LIMIT: usize = 32 * 1024;

static RETRY_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry(?:[ _-]after|Delay)?\D{0,6}(\d+(?:\.\d+)?)\s*s").unwrap()
});

/// 根据提示词规模选择模型，返回（首选模型，兜底模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    let fallover = if llm_config.model_powerful.trim().is_empty()
        || llm_config.model_powerful == llm_config.model_efficient
    {
        None
    } else {
        Some(llm_config.model_powerful.clone())
    };

    if system_prompt.len() + user_prompt.len() <= EFFICIENT_MODEL_PROMPT_LIMIT {
        return (llm_config.model_efficient.clone(), fallover);
    }
    match fallover {
        Some(powerful) => (powerful, None),
        None => (llm_config.model_efficient.clone(), None),
    }
}

/// 将provider返回的错误信息归类为限流或上游错误
pub fn classify_provider_error(service: &str, message: &str) -> PlannerError {
    let lowered = message.to_lowercase();
    let rate_limited = lowered.contains("429")
        || lowered.contains("rate limit")
        || lowered.contains("ratelimit")
        || lowered.contains("resource_exhausted")
        || lowered.contains("quota");

    if rate_limited {
        let retry_after = RETRY_AFTER
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(Duration::from_secs_f64);
        return PlannerError::RateLimit {
            service: service.to_string(),
            retry_after,
        };
    }

    PlannerError::upstream(service, message)
}
