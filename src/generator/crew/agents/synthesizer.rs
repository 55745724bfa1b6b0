use crate::config::Config;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::generator::types::AgentRole;
use crate::map::KEY_LOCATIONS_HEADING;
use crate::types::TripRequest;

/// 行程规划大师 - 汇总先前所有阶段的产出，编排逐日Markdown行程
#[derive(Default)]
pub struct Synthesizer;

impl StepForwardAgent for Synthesizer {
    fn role(&self) -> AgentRole {
        AgentRole::Synthesizer
    }

    fn prompt_template(&self, request: &TripRequest, config: &Config) -> PromptTemplate {
        let days = request.duration_days();
        let calendar = (1..=days)
            .filter_map(|day| {
                request
                    .date_of_day(day)
                    .map(|date| format!("- Day {}: {}", day, date.format("%A, %Y-%m-%d")))
            })
            .collect::<Vec<_>>()
            .join("\n");
        PromptTemplate {
            role: "Master Itinerary Planner".to_string(),
            goal: format!(
                "Create a balanced, exciting, and practical day-by-day travel itinerary for {} in {}. The itinerary must incorporate the traveler's interests ({}), respect the {} budget, and be logically structured.",
                request.duration_label(),
                request.destination(),
                request.interests_label(),
                request.budget_tier()
            ),
            backstory: "You are an expert travel planner renowned for crafting memorable and practical itineraries that flow smoothly and maximize enjoyment.".to_string(),

            opening_instruction: format!(
                "Compile a detailed day-by-day Markdown itinerary for a {} trip to {} from the destination analysis, activity research and cost estimation above. Consider travel times between activities and structure each day as Morning, Afternoon and Evening.",
                request.duration_label(),
                request.destination()
            ),

            closing_instruction: format!(
                r#"
## Output Requirements
- Write exactly {days} days, each starting with a heading `## Day N: <title>` (N from 1 to {days}), following this calendar:
{calendar}
- Under every day add the sub-sections `### Activities`, `### Cultural Tips`, `### Estimated Cost` and `### Emergency Contacts`
- List activities as bullets that start with the interests they serve in square brackets, e.g. `- [history] Morning: Kinkaku-ji`
- Give each day's estimated cost as a single amount or range in {currency}
- After the days add the sections `## Useful Phrases & Etiquette`, `## Important Contacts` and `## Budget & Cost Estimates`
- Write every local phrase in Latin script (romanised) with its English meaning, never in the native script
- The response MUST end with the exact heading "{heading}" followed by 3-5 prominent landmarks as bullet points, e.g.
{heading}
- Eiffel Tower, Paris
- Louvre Museum, Paris
- Nothing may follow that list"#,
                days = days,
                calendar = calendar,
                currency = config.currency,
                heading = KEY_LOCATIONS_HEADING
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BudgetTier;
    use chrono::NaiveDate;

    fn kyoto_template() -> PromptTemplate {
        let request = TripRequest::new(
            "Kyoto",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
            ["history"],
            BudgetTier::MidRange,
        )
        .unwrap();
        Synthesizer.prompt_template(&request, &Config::default())
    }

    #[test]
    fn test_prompt_lists_calendar_dates() {
        let closing = kyoto_template().closing_instruction;

        assert!(closing.contains(
            "- Day 1: Monday, 2024-04-01\n- Day 2: Tuesday, 2024-04-02\n- Day 3: Wednesday, 2024-04-03\n"
        ));
        assert!(!closing.contains("Day 4:"));
    }

    #[test]
    fn test_prompt_asks_for_romanised_phrases() {
        let closing = kyoto_template().closing_instruction;
        assert!(closing.contains("Latin script (romanised)"));
        assert!(closing.contains(KEY_LOCATIONS_HEADING));
    }
}
