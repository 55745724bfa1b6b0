use crate::config::Config;
use crate::error::PlannerResult;
use crate::generator::parser::parse_cost_estimate;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::generator::types::AgentRole;
use crate::types::TripRequest;

/// 花费估算师 - 基于常识估算每日与全程花费，不做实时查询
#[derive(Default)]
pub struct CostEstimator;

impl StepForwardAgent for CostEstimator {
    fn role(&self) -> AgentRole {
        AgentRole::CostEstimator
    }

    fn prompt_template(&self, request: &TripRequest, config: &Config) -> PromptTemplate {
        let currency = &config.currency;
        PromptTemplate {
            role: "Travel Cost Estimator".to_string(),
            goal: format!(
                "Provide a rough daily and total trip cost estimation in {} based on the destination ({}), trip duration ({}), the traveler's budget level ({}) and the types of activities planned. Clearly state that these are estimates. Do not look up real-time prices; use general knowledge.",
                currency,
                request.destination(),
                request.duration_label(),
                request.budget_tier()
            ),
            backstory: "You are an experienced travel budget advisor who can provide reasonable cost estimates for various travel styles and destinations, helping travelers plan their finances.".to_string(),

            opening_instruction: format!(
                "Based on the destination analysis and activity research, estimate typical expenses such as food, local transport and minor activities for this {} trip, excluding major international flights and pre-booked accommodation unless the budget level implies otherwise.",
                request.duration_label()
            ),

            closing_instruction: format!(
                r#"
## Output Requirements
Write a short section with exactly these two labelled lines, amounts given as numbers in {currency}:
Estimated Daily Cost ({currency}): [low]-[high]
Estimated Total Trip Cost ({currency}, excluding major transit/accommodation): [low]-[high]"#
            ),
        }
    }

    /// 输出中必须能解析出至少一个金额
    fn post_process(&self, output: &str, config: &Config) -> PlannerResult<()> {
        parse_cost_estimate(output, &config.currency).map(|_| ())
    }
}
