use std::sync::Arc;

use crate::config::Config;
use crate::error::{PlannerError, PlannerResult};
use crate::llm::{LLMClient, LanguageModel};
use crate::search::{SearchProvider, SerperSearch};

/// 行程生成上下文，持有配置与外部服务
#[derive(Clone)]
pub struct CrewContext {
    /// 配置
    pub config: Config,
    /// 语言模型服务
    pub llm: Arc<dyn LanguageModel>,
    /// 网络搜索服务
    pub search: Arc<dyn SearchProvider>,
}

impl CrewContext {
    /// 根据配置创建真实的外部服务。凭据须已写入配置。
    pub fn new(config: Config) -> PlannerResult<Self> {
        config.validate()?;
        let llm = LLMClient::new(config.llm.clone())
            .map_err(|e| PlannerError::Configuration(format!("无法创建LLM客户端: {}", e)))?;
        let search = SerperSearch::new(config.search.clone())?;

        Ok(Self::with_providers(config, Arc::new(llm), Arc::new(search)))
    }

    /// 使用给定的服务实现创建上下文
    pub fn with_providers(
        config: Config,
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            config,
            llm,
            search,
        }
    }
}
