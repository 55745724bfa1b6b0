use crate::config::Config;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::generator::types::AgentRole;
use crate::types::TripRequest;

/// 活动与兴趣专家 - 根据兴趣与预算挑选具体的活动、景点与餐厅
#[derive(Default)]
pub struct ActivityResearcher;

impl StepForwardAgent for ActivityResearcher {
    fn role(&self) -> AgentRole {
        AgentRole::ActivityResearcher
    }

    fn scrape_pages(&self, config: &Config) -> usize {
        config.search.scrape_pages
    }

    fn search_queries(&self, request: &TripRequest) -> Vec<String> {
        let budget = request.budget_tier().to_string().to_lowercase();
        request
            .interests()
            .iter()
            .map(|interest| {
                format!(
                    "best {} activities in {} for {} travelers",
                    interest,
                    request.destination(),
                    budget
                )
            })
            .collect()
    }

    fn prompt_template(&self, request: &TripRequest, _config: &Config) -> PromptTemplate {
        PromptTemplate {
            role: "Activity and Interest Specialist".to_string(),
            goal: format!(
                "Based on user interests ({}) and budget ({}), find specific activities, attractions, restaurants, and experiences in {}.",
                request.interests_label(),
                request.budget_tier(),
                request.destination()
            ),
            backstory: "You have a knack for finding unique and fitting experiences that match individual tastes and budgets, from hidden gems to popular hotspots.".to_string(),

            opening_instruction: format!(
                "Research and identify specific activities, sights, and dining options in {} that align with the traveler's interests and budget. Build on the destination brief from the previous task.",
                request.destination()
            ),

            closing_instruction: r#"
## Output Requirements
- A curated list of 5-7 varied activities, sights and dining options
- Start every suggestion with the interests it serves in square brackets, e.g. `- [history, food] Nishiki Market tasting walk`
- Give each suggestion a one or two sentence description and a rough price level"#
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BudgetTier;
    use chrono::NaiveDate;

    #[test]
    fn test_one_query_per_interest() {
        let request = TripRequest::new(
            "Kyoto",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
            ["history", "food"],
            BudgetTier::Budget,
        )
        .unwrap();

        let queries = ActivityResearcher.search_queries(&request);
        assert_eq!(
            queries,
            vec![
                "best food activities in Kyoto for budget-friendly travelers",
                "best history activities in Kyoto for budget-friendly travelers"
            ]
        );
    }
}
