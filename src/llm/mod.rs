//! 语言模型服务抽象

use async_trait::async_trait;

use crate::error::PlannerResult;

pub mod client;

pub use client::LLMClient;

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// 日志标签，通常为发起请求的智能体名称
    pub log_tag: String,
    /// 系统提示词（角色、目标、背景）
    pub preamble: String,
    /// 用户提示词
    pub prompt: String,
    /// 先前阶段的产出，按顺序排列
    pub context: Vec<String>,
}

impl GenerationRequest {
    /// 将上下文与用户提示词拼接为发送给模型的完整文本
    pub fn render_user_prompt(&self) -> String {
        if self.context.is_empty() {
            return self.prompt.clone();
        }

        let mut rendered = String::from("# 先前阶段的产出 (Context from previous tasks)\n\n");
        for (index, item) in self.context.iter().enumerate() {
            rendered.push_str(&format!("## Context {}\n{}\n\n", index + 1, item.trim()));
        }
        rendered.push_str("---\n\n");
        rendered.push_str(&self.prompt);
        rendered
    }
}

/// 语言模型服务，给定提示词与上下文返回生成文本
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> PlannerResult<String>;

    /// 启动时的连通性检查
    async fn check_connection(&self) -> PlannerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_context_is_prompt() {
        let request = GenerationRequest {
            log_tag: "test".to_string(),
            preamble: "You are a planner".to_string(),
            prompt: "Plan a trip".to_string(),
            context: vec![],
        };
        assert_eq!(request.render_user_prompt(), "Plan a trip");
    }

    #[test]
    fn test_render_keeps_context_order() {
        let request = GenerationRequest {
            log_tag: "test".to_string(),
            preamble: String::new(),
            prompt: "Synthesize".to_string(),
            context: vec!["brief".to_string(), "activities".to_string()],
        };
        let rendered = request.render_user_prompt();
        let brief_at = rendered.find("brief").unwrap();
        let activities_at = rendered.find("activities").unwrap();
        let prompt_at = rendered.find("Synthesize").unwrap();
        assert!(brief_at < activities_at);
        assert!(activities_at < prompt_at);
        assert!(rendered.contains("## Context 2"));
    }
}
