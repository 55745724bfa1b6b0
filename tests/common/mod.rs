#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use travel_crew_rs::config::Config;
use travel_crew_rs::llm::{GenerationRequest, LanguageModel};
use travel_crew_rs::map::{GeoPoint, Geocoder};
use travel_crew_rs::search::{SearchHit, SearchProvider};
use travel_crew_rs::{BudgetTier, CrewContext, PlannerError, PlannerResult, TripRequest};

pub const ANALYST_OUTPUT: &str = "## Kyoto Overview\nSpring brings cherry blossoms and crowds.\n\n## Important Contacts\n- Police: 110\n- Ambulance/Fire: 119";

pub const ACTIVITIES_OUTPUT: &str = "- [history] Kinkaku-ji, the Golden Pavilion\n- [history] Fushimi Inari Shrine\n- [food] Nishiki Market food walk\n- [food] Kaiseki dinner in Gion";

pub const COST_OUTPUT: &str = "Estimated Daily Cost (INR): ₹3000-₹5000\nEstimated Total Trip Cost (INR, excluding major transit/accommodation): ₹9000-₹15000";

pub const KYOTO_ITINERARY: &str = r#"# Kyoto: 3 Days of History & Food

## Day 1: Northern Temples
### Activities
- [history] Morning: Visit Kinkaku-ji, the Golden Pavilion
- [food] Lunch at Nishiki Market
### Estimated Cost
- ₹4,500

## Day 2: Fushimi and Gion
### Activities
- [history] Walk the torii gates of Fushimi Inari Shrine
- [food] Kaiseki dinner in Gion
### Estimated Cost
- ₹6,000

## Day 3: Arashiyama
### Activities
- [history] Tenryu-ji temple garden
- [food] Matcha tasting at a tea house

## Useful Phrases & Etiquette
- Bow slightly when greeting

## Important Contacts
- Police: 110

Key Locations for Map:
- Kinkaku-ji, Kyoto
- Fushimi Inari Shrine, Kyoto
- Arashiyama Bamboo Grove, Kyoto
"#;

/// 按角色返回固定文本，并记录每一次调用
pub struct RecordingModel {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl RecordingModel {
    pub fn kyoto() -> Self {
        Self::with_responses([
            ("DestinationAnalyst", ANALYST_OUTPUT),
            ("ActivityResearcher", ACTIVITIES_OUTPUT),
            ("CostEstimator", COST_OUTPUT),
            ("Synthesizer", KYOTO_ITINERARY),
        ])
    }

    pub fn with_responses<const N: usize>(responses: [(&str, &str); N]) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(tag, text)| (tag.to_string(), text.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 覆盖某个角色的输出
    pub fn replace(mut self, tag: &str, text: &str) -> Self {
        self.responses.insert(tag.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_order(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.log_tag).collect()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn generate(&self, request: &GenerationRequest) -> PlannerResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .get(&request.log_tag)
            .cloned()
            .ok_or_else(|| PlannerError::upstream("llm/test", "no scripted response"))
    }
}

/// 网页抓取的行为
enum PageMode {
    Unsupported,
    Text(String),
    Broken,
}

/// 搜索替身，可设置为始终失败
pub struct StaticSearch {
    fail: bool,
    pages: PageMode,
    queries: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl StaticSearch {
    fn new(fail: bool, pages: PageMode) -> Self {
        Self {
            fail,
            pages,
            queries: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(false, PageMode::Unsupported)
    }

    pub fn failing() -> Self {
        Self::new(true, PageMode::Unsupported)
    }

    /// 每个网页都返回同一段正文
    pub fn with_pages(text: &str) -> Self {
        Self::new(false, PageMode::Text(text.to_string()))
    }

    /// 搜索正常，抓取网页总是失败
    pub fn with_broken_pages() -> Self {
        Self::new(false, PageMode::Broken)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> PlannerResult<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(PlannerError::upstream("search/test", "connection refused"));
        }
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            snippet: "Travel notes".to_string(),
            url: "https://example.com/kyoto".to_string(),
        }])
    }

    async fn fetch_page(&self, url: &str) -> PlannerResult<Option<String>> {
        match &self.pages {
            PageMode::Unsupported => Ok(None),
            PageMode::Text(text) => {
                self.fetched.lock().unwrap().push(url.to_string());
                Ok(Some(text.clone()))
            }
            PageMode::Broken => {
                self.fetched.lock().unwrap().push(url.to_string());
                Err(PlannerError::upstream("search/page", "status 404 Not Found"))
            }
        }
    }
}

/// 只认识京都景点的地理编码替身
pub struct KyotoGeocoder;

#[async_trait]
impl Geocoder for KyotoGeocoder {
    async fn geocode(&self, place: &str) -> PlannerResult<Option<GeoPoint>> {
        let point = match place {
            "Kinkaku-ji, Kyoto" => Some((35.0394, 135.7292)),
            "Fushimi Inari Shrine, Kyoto" => Some((34.9671, 135.7727)),
            _ => None,
        };
        Ok(point.map(|(latitude, longitude)| GeoPoint {
            latitude,
            longitude,
        }))
    }
}

pub fn kyoto_request() -> TripRequest {
    TripRequest::new(
        "Kyoto",
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
        ["history", "food"],
        BudgetTier::MidRange,
    )
    .unwrap()
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        output_path: dir.path().join("out"),
        currency: "INR".to_string(),
        ..Config::default()
    }
}

pub fn context_with(
    config: Config,
    model: Arc<RecordingModel>,
    search: Arc<StaticSearch>,
) -> CrewContext {
    CrewContext::with_providers(config, model, search)
}
