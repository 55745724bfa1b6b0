use crate::config::{Config, LLMProvider};
use crate::error::PlannerResult;
use crate::types::{BudgetTier, TripRequest};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Travel Crew - 由Rust与多智能体LLM驱动的旅行行程规划器
#[derive(Parser, Debug)]
#[command(name = "travel-crew")]
#[command(
    about = "AI travel planner: a crew of four LLM agents researches a destination, suggests activities, estimates costs and writes a day-by-day itinerary with a map and a PDF."
)]
#[command(version)]
pub struct Args {
    /// 目的地，例如 "Kyoto, Japan"
    #[arg(short, long)]
    pub destination: String,

    /// 出发日期 (YYYY-MM-DD)
    #[arg(short, long)]
    pub start_date: NaiveDate,

    /// 返程日期 (YYYY-MM-DD)，包含当天
    #[arg(short, long)]
    pub end_date: NaiveDate,

    /// 兴趣标签，逗号分隔，例如 history,food
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub interests: Vec<String>,

    /// 预算档位 (budget, mid-range, luxury)
    #[arg(short, long, default_value = "mid-range")]
    pub budget: BudgetTier,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 花费估算币种，例如 INR
    #[arg(long)]
    pub currency: Option<String>,

    /// LLM Provider (gemini, openai, deepseek, anthropic, openrouter, mistral, moonshot)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 高能效模型，优先用于常规规划任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长上下文任务，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 不生成地图
    #[arg(long)]
    pub no_map: bool,

    /// 不生成PDF
    #[arg(long)]
    pub no_pdf: bool,

    /// 跳过启动时的模型连通性检查
    #[arg(long)]
    pub skip_connection_check: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 由CLI参数构造行程请求
    pub fn to_request(&self) -> PlannerResult<TripRequest> {
        TripRequest::new(
            &self.destination,
            self.start_date,
            self.end_date,
            &self.interests,
            self.budget,
        )
    }

    /// 将CLI参数转换为配置：配置文件 → CLI覆盖 → 环境变量中的凭据
    pub fn into_config(self) -> Result<Config> {
        let mut config = self.load_config_file()?;

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }
        if let Some(currency) = self.currency {
            config.currency = currency.trim().to_uppercase();
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }

        // 其他配置
        if self.no_map {
            config.map.enabled = false;
        }
        if self.no_pdf {
            config.export.pdf = false;
        }
        config.skip_connection_check |= self.skip_connection_check;
        config.verbose |= self.verbose;

        config.apply_env();
        Ok(config)
    }

    fn load_config_file(&self) -> Result<Config> {
        // 显式指定的配置文件必须可读
        if let Some(config_path) = &self.config {
            return Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path));
        }

        let default_config_path = Config::default_config_path();
        if default_config_path.exists() {
            Config::from_file(&default_config_path)
                .with_context(|| format!("无法读取默认配置文件 {:?}", default_config_path))
        } else {
            Ok(Config::default())
        }
    }
}
