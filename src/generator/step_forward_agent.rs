use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{PlannerError, PlannerResult};
use crate::generator::context::CrewContext;
use crate::generator::types::{AgentRole, Artifact};
use crate::llm::GenerationRequest;
use crate::search::{SearchHit, format_page_excerpts, format_search_notes, top_urls};
use crate::types::TripRequest;

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 角色名称
    pub role: String,
    /// 角色目标
    pub goal: String,
    /// 角色背景
    pub backstory: String,
    /// 开头的任务说明
    pub opening_instruction: String,
    /// 结尾的输出要求
    pub closing_instruction: String,
}

impl PromptTemplate {
    /// 由角色、目标与背景组成的系统提示词
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}\nAnswer in English, using Markdown.",
            self.role, self.backstory, self.goal
        )
    }
}

/// 标准的Agent Prompt构建器
pub struct GeneratorPromptBuilder {
    template: PromptTemplate,
}

impl GeneratorPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// 构建系统提示词和用户提示词
    pub fn build_prompts(
        &self,
        request: &TripRequest,
        research_notes: Option<&str>,
    ) -> (String, String) {
        (
            self.template.system_prompt(),
            self.build_user_prompt(request, research_notes),
        )
    }

    fn build_user_prompt(&self, request: &TripRequest, research_notes: Option<&str>) -> String {
        let mut prompt = String::new();

        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        prompt.push_str(&format_trip_request(request));

        if let Some(notes) = research_notes.filter(|notes| !notes.trim().is_empty()) {
            prompt.push_str("## Research Notes\n");
            prompt.push_str(notes);
            prompt.push('\n');
        }

        prompt.push_str(&self.template.closing_instruction);
        prompt
    }
}

/// 行程请求的提示词片段
pub fn format_trip_request(request: &TripRequest) -> String {
    format!(
        "## Trip Request\n- Destination: {}\n- Dates: {} to {} ({})\n- Interests: {}\n- Budget: {}\n\n",
        request.destination(),
        request.start_date(),
        request.end_date(),
        request.duration_label(),
        request.interests_label(),
        request.budget_tier()
    )
}

/// 流水线中的一个阶段
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// Agent角色
    fn role(&self) -> AgentRole;

    /// Prompt模板配置
    fn prompt_template(&self, request: &TripRequest, config: &Config) -> PromptTemplate;

    /// 调用模型前需要执行的搜索
    fn search_queries(&self, _request: &TripRequest) -> Vec<String> {
        Vec::new()
    }

    /// 搜索后抓取正文的网页数
    fn scrape_pages(&self, _config: &Config) -> usize {
        0
    }

    /// 可选的产出校验钩子
    fn post_process(&self, _output: &str, _config: &Config) -> PlannerResult<()> {
        Ok(())
    }

    /// 默认实现的execute方法：搜索 → 构建prompt → 调用模型 → 校验
    async fn execute(
        &self,
        context: &CrewContext,
        request: &TripRequest,
        prior: &[Artifact],
    ) -> PlannerResult<Artifact> {
        let role = self.role();

        // 1. 搜索调研材料
        let queries = self.search_queries(request);
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let hits = context.search.search(&query).await?;
            debug!(target: "crew", role = %role, query = %query, hits = hits.len(), "search finished");
            results.push((query, hits));
        }
        let excerpts =
            fetch_page_excerpts(context, role, &results, self.scrape_pages(&context.config)).await;
        let research_notes = (!results.is_empty()).then(|| {
            let mut notes = format_search_notes(&results);
            notes.push_str(&format_page_excerpts(&excerpts));
            notes
        });

        // 2. 构建prompt
        let template = self.prompt_template(request, &context.config);
        let (system_prompt, user_prompt) =
            GeneratorPromptBuilder::new(template).build_prompts(request, research_notes.as_deref());

        // 3. 调用模型，先前阶段的产出按顺序作为上下文
        let generation = GenerationRequest {
            log_tag: role.to_string(),
            preamble: system_prompt,
            prompt: user_prompt,
            context: prior.iter().map(|artifact| artifact.content.clone()).collect(),
        };
        let text = context.llm.generate(&generation).await?;
        let content = text.trim();
        if content.is_empty() {
            return Err(PlannerError::empty(role.to_string()));
        }

        // 4. 执行后处理
        self.post_process(content, &context.config)?;

        Ok(Artifact {
            role,
            content: content.to_string(),
        })
    }
}

/// 抓取排名靠前的网页正文，单个网页失败时跳过
async fn fetch_page_excerpts(
    context: &CrewContext,
    role: AgentRole,
    results: &[(String, Vec<SearchHit>)],
    limit: usize,
) -> Vec<(String, String)> {
    let mut excerpts = Vec::new();
    for url in top_urls(results, limit) {
        match context.search.fetch_page(&url).await {
            Ok(Some(text)) => excerpts.push((url, text)),
            Ok(None) => {}
            Err(err) => {
                warn!(target: "crew", role = %role, url = %url, error = %err, "page fetch failed, using snippets only");
            }
        }
    }
    excerpts
}
