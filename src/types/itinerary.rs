use serde::{Deserialize, Serialize};

/// 单条活动安排，附带其对应的兴趣标签
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Activity {
    /// 活动描述
    pub description: String,

    /// 该活动服务的兴趣标签（小写）
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Activity {
    pub fn new(description: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            description: description.into(),
            tags,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// 单日计划
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DayPlan {
    /// 第几天，从1开始
    pub day_index: u32,

    /// 当日标题（如果模型给出）
    #[serde(default)]
    pub title: Option<String>,

    pub activities: Vec<Activity>,

    #[serde(default)]
    pub cultural_tips: Vec<String>,

    /// 当日预估花费，单位为行程币种
    pub estimated_cost: f64,

    #[serde(default)]
    pub emergency_contacts: Vec<String>,
}

/// 流水线的最终产物，地图渲染与PDF导出只读消费
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Itinerary {
    pub destination: String,

    /// 花费所使用的币种代码，例如 INR
    pub currency: String,

    pub day_plans: Vec<DayPlan>,

    /// 全程预估花费（不含长途交通与住宿）
    #[serde(default)]
    pub total_estimated_cost: Option<f64>,

    /// 供地图标注的关键地点
    #[serde(default)]
    pub key_locations: Vec<String>,

    /// 行程合成智能体输出的Markdown原文
    pub document: String,
}

impl Itinerary {
    pub fn total_days(&self) -> usize {
        self.day_plans.len()
    }

    /// 各日预估花费之和
    pub fn sum_of_daily_costs(&self) -> f64 {
        self.day_plans.iter().map(|day| day.estimated_cost).sum()
    }
}

/// 花费区间
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CostRange {
    pub low: f64,
    pub high: f64,
}

impl CostRange {
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn single(amount: f64) -> Self {
        Self {
            low: amount,
            high: amount,
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// 花费估算智能体输出的结构化结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostEstimate {
    pub currency: String,
    pub daily: Option<CostRange>,
    pub total: Option<CostRange>,
}

impl CostEstimate {
    /// 单日花费的参考值；只有全程花费时按天数均摊
    pub fn daily_reference(&self, days: u32) -> Option<f64> {
        if let Some(daily) = self.daily {
            return Some(daily.midpoint());
        }
        self.total
            .map(|total| total.midpoint() / f64::from(days.max(1)))
    }
}
