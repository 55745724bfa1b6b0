//! Serper (google.serper.dev) 搜索服务

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{SearchHit, SearchProvider, page_text};
use crate::config::SearchConfig;
use crate::error::{PlannerError, PlannerResult};

const SERVICE: &str = "search/serper";
const PAGE_SERVICE: &str = "search/page";

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(rename = "answerBox")]
    answer_box: Option<SerperAnswerBox>,
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperAnswerBox {
    title: Option<String>,
    snippet: Option<String>,
    answer: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

/// 基于Serper API的搜索服务
pub struct SerperSearch {
    config: SearchConfig,
    http_client: reqwest::Client,
}

impl SerperSearch {
    pub fn new(config: SearchConfig) -> PlannerResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PlannerError::Configuration(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn search_once(&self, query: &str) -> PlannerResult<Vec<SearchHit>> {
        let url = format!("{}/search", self.config.api_base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .header("X-API-KEY", &self.config.api_key)
            .json(&json!({ "q": query, "num": self.config.results_per_query }))
            .send()
            .await
            .map_err(|e| {
                warn!(target: "search", error = %e, "Serper request failed");
                PlannerError::upstream(SERVICE, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "search", status = %status, "Serper returned error status");
            let message = match status.as_u16() {
                401 | 403 => format!("认证失败 ({}): {}", status, body),
                402 | 429 => format!("配额不足 ({}): {}", status, body),
                _ => format!("status {}: {}", status, body),
            };
            return Err(PlannerError::upstream(SERVICE, message));
        }

        let parsed: SerperResponse = response.json().await.map_err(|e| {
            warn!(target: "search", error = %e, "failed to parse Serper response");
            PlannerError::upstream(SERVICE, format!("无法解析搜索结果: {}", e))
        })?;

        Ok(self.collect_hits(parsed))
    }

    fn collect_hits(&self, response: SerperResponse) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        if let Some(answer) = response.answer_box {
            let snippet = answer.answer.or(answer.snippet).unwrap_or_default();
            if !snippet.trim().is_empty() {
                hits.push(SearchHit {
                    title: answer.title.unwrap_or_else(|| "Answer".to_string()),
                    snippet,
                    url: answer.link.unwrap_or_default(),
                });
            }
        }

        hits.extend(response.organic.into_iter().map(|item| SearchHit {
            title: item.title,
            snippet: item.snippet,
            url: item.link,
        }));
        hits.truncate(self.config.results_per_query.max(1));
        hits
    }

    fn is_fatal(err: &PlannerError) -> bool {
        match err {
            PlannerError::UpstreamService { message, .. } => message.starts_with("认证失败"),
            _ => true,
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str) -> PlannerResult<Vec<SearchHit>> {
        debug!(target: "search", query = %query, "performing Serper search");
        let max_attempts = self.config.retry_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.search_once(query).await {
                Ok(hits) => return Ok(hits),
                Err(err) if Self::is_fatal(&err) || attempt >= max_attempts => return Err(err),
                Err(err) => {
                    warn!(target: "search", attempt, error = %err, "search failed, retrying");
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> PlannerResult<Option<String>> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Ok(None);
        }
        debug!(target: "search", url = %url, "fetching page");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| PlannerError::upstream(PAGE_SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::upstream(
                PAGE_SERVICE,
                format!("status {} for {}", status, url),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PlannerError::upstream(PAGE_SERVICE, e))?;
        let text = page_text(&html, self.config.scrape_max_chars);
        Ok((!text.is_empty()).then_some(text))
    }
}
