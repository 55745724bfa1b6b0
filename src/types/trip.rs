use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{PlannerError, PlannerResult};

/// 预算档位
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BudgetTier {
    #[serde(rename = "budget")]
    Budget,
    #[serde(rename = "mid-range")]
    #[default]
    MidRange,
    #[serde(rename = "luxury")]
    Luxury,
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetTier::Budget => write!(f, "Budget-Friendly"),
            BudgetTier::MidRange => write!(f, "Mid-Range"),
            BudgetTier::Luxury => write!(f, "Luxury"),
        }
    }
}

impl std::str::FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" | "budget-friendly" | "cheap" => Ok(BudgetTier::Budget),
            "mid" | "mid-range" | "midrange" | "mid_range" => Ok(BudgetTier::MidRange),
            "luxury" | "premium" => Ok(BudgetTier::Luxury),
            _ => Err(format!("Unknown budget tier: {}", s)),
        }
    }
}

/// 一次提交的出行偏好，整个流水线运行期间不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripRequest {
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    interests: BTreeSet<String>,
    budget_tier: BudgetTier,
}

impl TripRequest {
    /// 校验并构造行程请求
    pub fn new<I, S>(
        destination: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interests: I,
        budget_tier: BudgetTier,
    ) -> PlannerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PlannerError::InvalidRequest("目的地不能为空".to_string()));
        }
        if end_date < start_date {
            return Err(PlannerError::InvalidRequest(format!(
                "结束日期 {} 早于开始日期 {}",
                end_date, start_date
            )));
        }

        let interests: BTreeSet<String> = interests
            .into_iter()
            .map(|interest| interest.as_ref().trim().to_lowercase())
            .filter(|interest| !interest.is_empty())
            .collect();
        if interests.is_empty() {
            return Err(PlannerError::InvalidRequest(
                "至少需要提供一个兴趣标签".to_string(),
            ));
        }

        Ok(Self {
            destination: destination.to_string(),
            start_date,
            end_date,
            interests,
            budget_tier,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn interests(&self) -> &BTreeSet<String> {
        &self.interests
    }

    pub fn budget_tier(&self) -> BudgetTier {
        self.budget_tier
    }

    /// 行程天数，首尾两天都计入
    pub fn duration_days(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32 + 1
    }

    /// 人类可读的行程时长，例如 `3 days`
    pub fn duration_label(&self) -> String {
        match self.duration_days() {
            1 => "1 day".to_string(),
            n => format!("{} days", n),
        }
    }

    pub fn interests_label(&self) -> String {
        self.interests
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 第 `day_index` 天（从1开始）对应的日期
    pub fn date_of_day(&self, day_index: u32) -> Option<NaiveDate> {
        if day_index == 0 || day_index > self.duration_days() {
            return None;
        }
        self.start_date
            .checked_add_days(chrono::Days::new(u64::from(day_index - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_budget_tier_from_str() {
        assert_eq!("budget".parse::<BudgetTier>().unwrap(), BudgetTier::Budget);
        assert_eq!(
            "Budget-Friendly".parse::<BudgetTier>().unwrap(),
            BudgetTier::Budget
        );
        assert_eq!("mid-range".parse::<BudgetTier>().unwrap(), BudgetTier::MidRange);
        assert_eq!("MID".parse::<BudgetTier>().unwrap(), BudgetTier::MidRange);
        assert_eq!("luxury".parse::<BudgetTier>().unwrap(), BudgetTier::Luxury);
        assert!("free".parse::<BudgetTier>().is_err());
    }

    #[test]
    fn test_budget_tier_display() {
        assert_eq!(BudgetTier::Budget.to_string(), "Budget-Friendly");
        assert_eq!(BudgetTier::MidRange.to_string(), "Mid-Range");
        assert_eq!(BudgetTier::Luxury.to_string(), "Luxury");
    }

    #[test]
    fn test_request_normalizes_interests() {
        let request = TripRequest::new(
            "  Kyoto ",
            date("2024-04-01"),
            date("2024-04-03"),
            ["History", " food ", "history", ""],
            BudgetTier::MidRange,
        )
        .unwrap();

        assert_eq!(request.destination(), "Kyoto");
        assert_eq!(request.interests().len(), 2);
        assert!(request.interests().contains("history"));
        assert!(request.interests().contains("food"));
        assert_eq!(request.interests_label(), "food, history");
    }

    #[test]
    fn test_duration_is_inclusive() {
        let request = TripRequest::new(
            "Kyoto",
            date("2024-04-01"),
            date("2024-04-03"),
            ["history"],
            BudgetTier::MidRange,
        )
        .unwrap();
        assert_eq!(request.duration_days(), 3);
        assert_eq!(request.duration_label(), "3 days");
        assert_eq!(request.date_of_day(1), Some(date("2024-04-01")));
        assert_eq!(request.date_of_day(3), Some(date("2024-04-03")));
        assert_eq!(request.date_of_day(4), None);
        assert_eq!(request.date_of_day(0), None);

        let day_trip = TripRequest::new(
            "Nara",
            date("2024-04-02"),
            date("2024-04-02"),
            ["nature"],
            BudgetTier::Budget,
        )
        .unwrap();
        assert_eq!(day_trip.duration_days(), 1);
        assert_eq!(day_trip.duration_label(), "1 day");
    }

    #[test]
    fn test_request_rejects_invalid_input() {
        let blank = TripRequest::new(
            "   ",
            date("2024-04-01"),
            date("2024-04-03"),
            ["history"],
            BudgetTier::MidRange,
        );
        assert!(matches!(blank, Err(PlannerError::InvalidRequest(_))));

        let reversed = TripRequest::new(
            "Kyoto",
            date("2024-04-03"),
            date("2024-04-01"),
            ["history"],
            BudgetTier::MidRange,
        );
        assert!(matches!(reversed, Err(PlannerError::InvalidRequest(_))));

        let no_interests = TripRequest::new(
            "Kyoto",
            date("2024-04-01"),
            date("2024-04-03"),
            Vec::<String>::new(),
            BudgetTier::MidRange,
        );
        assert!(matches!(no_interests, Err(PlannerError::InvalidRequest(_))));
    }
}
