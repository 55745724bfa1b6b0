use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::PlannerError;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "travel-crew.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "moonshot")]
    Moonshot,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "mistral" => Ok(LLMProvider::Mistral),
            "moonshot" => Ok(LLMProvider::Moonshot),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 输出路径
    pub output_path: PathBuf,

    /// 花费估算使用的币种
    pub currency: String,

    /// 单次规划允许的最大天数
    pub max_trip_days: u32,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索服务配置
    pub search: SearchConfig,

    /// 地图渲染配置
    pub map: MapConfig,

    /// 文档导出配置
    pub export: ExportConfig,

    /// 跳过启动时的模型连通性检查
    pub skip_connection_check: bool,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，为空时使用provider默认地址
    pub api_base_url: String,

    /// 高能效模型，用于常规规划任务
    pub model_efficient: String,

    /// 高质量模型，用于长上下文任务，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次调用超时时间（秒）
    pub timeout_seconds: u64,
}

/// 搜索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// 搜索服务 API KEY
    pub api_key: String,

    /// 搜索服务基地址
    pub api_base_url: String,

    /// 每次查询返回的结果条数
    pub results_per_query: usize,

    pub timeout_seconds: u64,

    pub retry_attempts: u32,

    pub retry_delay_ms: u64,

    /// 每个阶段抓取正文的网页数，0表示只使用搜索摘要
    pub scrape_pages: usize,

    /// 每个网页保留的最大字符数
    pub scrape_max_chars: usize,
}

/// 地图渲染配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub enabled: bool,

    /// 地理编码服务地址
    pub geocoder_url: String,

    /// 地理编码请求的User-Agent，Nominatim要求必须提供
    pub user_agent: String,

    pub timeout_seconds: u64,

    /// 两次地理编码请求之间的最小间隔（毫秒）
    pub min_interval_ms: u64,

    /// 最多标注的地点数
    pub max_locations: usize,

    pub zoom: u8,
}

/// 文档导出配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub pdf: bool,

    pub html: bool,

    pub json: bool,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 使用环境变量中的凭据填充配置，只在程序启动时调用
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 以给定的查找函数填充凭据，显式配置优先于环境变量
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if self.llm.api_key.trim().is_empty()
            && let Some(key) = non_empty("TRAVEL_CREW_LLM_API_KEY").or_else(|| {
                non_empty(Self::provider_key_env(&self.llm.provider))
            })
        {
            self.llm.api_key = key;
        }

        if self.search.api_key.trim().is_empty()
            && let Some(key) = non_empty("SERPER_API_KEY")
        {
            self.search.api_key = key;
        }
    }

    /// 各provider约定俗成的API KEY环境变量名
    pub fn provider_key_env(provider: &LLMProvider) -> &'static str {
        match provider {
            LLMProvider::Gemini => "GEMINI_API_KEY",
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::DeepSeek => "DEEPSEEK_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
            LLMProvider::Mistral => "MISTRAL_API_KEY",
            LLMProvider::Moonshot => "MOONSHOT_API_KEY",
        }
    }

    /// 校验启动所必需的配置，缺少凭据属于致命错误
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(PlannerError::Configuration(format!(
                "缺少LLM API KEY，请设置环境变量 {} 或 TRAVEL_CREW_LLM_API_KEY",
                Self::provider_key_env(&self.llm.provider)
            )));
        }
        if self.search.api_key.trim().is_empty() {
            return Err(PlannerError::Configuration(
                "缺少搜索服务 API KEY，请设置环境变量 SERPER_API_KEY".to_string(),
            ));
        }
        if self.llm.model_efficient.trim().is_empty() {
            return Err(PlannerError::Configuration("未配置模型名称".to_string()));
        }
        if self.max_trip_days == 0 {
            return Err(PlannerError::Configuration(
                "max_trip_days 必须大于0".to_string(),
            ));
        }
        Ok(())
    }

    /// 查找默认配置文件
    pub fn default_config_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./travel-crew.out"),
            currency: String::from("INR"),
            max_trip_days: 30,
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            map: MapConfig::default(),
            export: ExportConfig::default(),
            skip_connection_check: false,
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::new(),
            model_efficient: String::from("gemini-1.5-flash-latest"),
            model_powerful: String::from("gemini-1.5-pro-latest"),
            max_tokens: 8192,
            temperature: 0.4,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: String::from("https://google.serper.dev"),
            results_per_query: 5,
            timeout_seconds: 20,
            retry_attempts: 2,
            retry_delay_ms: 1000,
            scrape_pages: 2,
            scrape_max_chars: 3000,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            geocoder_url: String::from("https://nominatim.openstreetmap.org"),
            user_agent: String::from("travel_crew_rs/0.3"),
            timeout_seconds: 10,
            min_interval_ms: 1000,
            max_locations: 8,
            zoom: 10,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pdf: true,
            html: true,
            json: true,
        }
    }
}
