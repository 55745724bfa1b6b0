//! 网络搜索服务抽象

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlannerResult;

mod scrape;
mod serper;

pub use scrape::page_text;
pub use serper::SerperSearch;

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// 搜索服务，按相关度返回网页摘要
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> PlannerResult<Vec<SearchHit>>;

    /// 抓取网页正文，不支持抓取的服务返回None
    async fn fetch_page(&self, _url: &str) -> PlannerResult<Option<String>> {
        Ok(None)
    }
}

/// 将一组查询结果格式化为提示词中的调研材料
pub fn format_search_notes(results: &[(String, Vec<SearchHit>)]) -> String {
    let mut notes = String::new();
    for (query, hits) in results {
        notes.push_str(&format!("### Search: {}\n", query));
        if hits.is_empty() {
            notes.push_str("(no results)\n\n");
            continue;
        }
        for (index, hit) in hits.iter().enumerate() {
            notes.push_str(&format!("{}. {} ({})\n", index + 1, hit.title, hit.url));
            if !hit.snippet.trim().is_empty() {
                notes.push_str(&format!("   {}\n", hit.snippet.trim()));
            }
        }
        notes.push('\n');
    }
    notes
}

/// 按排名轮流取各查询的结果，返回去重后的前limit个网址
pub fn top_urls(results: &[(String, Vec<SearchHit>)], limit: usize) -> Vec<String> {
    let deepest = results.iter().map(|(_, hits)| hits.len()).max().unwrap_or(0);
    let mut urls: Vec<String> = Vec::new();

    for rank in 0..deepest {
        for (_, hits) in results {
            let Some(hit) = hits.get(rank) else { continue };
            let url = hit.url.trim();
            if urls.len() >= limit {
                return urls;
            }
            if !url.is_empty() && !urls.iter().any(|seen| seen == url) {
                urls.push(url.to_string());
            }
        }
    }
    urls
}

/// 网页正文摘录的提示词片段
pub fn format_page_excerpts(excerpts: &[(String, String)]) -> String {
    if excerpts.is_empty() {
        return String::new();
    }

    let mut notes = String::from("## Page Excerpts\n");
    for (url, text) in excerpts {
        notes.push_str(&format!("### {}\n{}\n\n", url, text.trim()));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_search_notes() {
        let results = vec![
            (
                "Kyoto culture".to_string(),
                vec![SearchHit {
                    title: "Kyoto etiquette".to_string(),
                    snippet: " Bow slightly when greeting. ".to_string(),
                    url: "https://example.com/etiquette".to_string(),
                }],
            ),
            ("Kyoto phrases".to_string(), vec![]),
        ];

        let notes = format_search_notes(&results);
        assert!(notes.contains("### Search: Kyoto culture"));
        assert!(notes.contains("1. Kyoto etiquette (https://example.com/etiquette)"));
        assert!(notes.contains("   Bow slightly when greeting.\n"));
        assert!(notes.contains("### Search: Kyoto phrases\n(no results)"));
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: "Kyoto".to_string(),
            snippet: String::new(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_top_urls_alternates_between_queries() {
        let results = vec![
            (
                "Kyoto attractions".to_string(),
                vec![hit("https://a.example/1"), hit("https://a.example/2")],
            ),
            (
                "Kyoto etiquette".to_string(),
                vec![hit(""), hit("https://a.example/1"), hit("https://b.example/3")],
            ),
        ];

        assert_eq!(
            top_urls(&results, 3),
            vec!["https://a.example/1", "https://a.example/2", "https://b.example/3"]
        );
        assert_eq!(top_urls(&results, 1), vec!["https://a.example/1"]);
        assert!(top_urls(&results, 0).is_empty());
    }

    #[test]
    fn test_format_page_excerpts() {
        assert_eq!(format_page_excerpts(&[]), "");

        let notes = format_page_excerpts(&[(
            "https://example.com/gion".to_string(),
            " Lantern-lit streets. ".to_string(),
        )]);
        assert_eq!(
            notes,
            "## Page Excerpts\n### https://example.com/gion\nLantern-lit streets.\n\n"
        );
    }
}
