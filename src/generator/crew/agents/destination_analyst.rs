use crate::config::Config;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::generator::types::AgentRole;
use crate::types::TripRequest;

/// 目的地分析师 - 负责收集目的地概况、文化礼仪、安全信息、紧急电话与常用短语
#[derive(Default)]
pub struct DestinationAnalyst;

impl StepForwardAgent for DestinationAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::DestinationAnalyst
    }

    fn scrape_pages(&self, config: &Config) -> usize {
        config.search.scrape_pages
    }

    fn search_queries(&self, request: &TripRequest) -> Vec<String> {
        let destination = request.destination();
        vec![
            format!("{} top attractions and essential travel facts", destination),
            format!("{} cultural etiquette and customs for tourists", destination),
            format!(
                "{} safety tips and emergency phone numbers police ambulance",
                destination
            ),
            format!("{} basic local phrases for travelers with pronunciation", destination),
        ]
    }

    fn prompt_template(&self, request: &TripRequest, _config: &Config) -> PromptTemplate {
        let destination = request.destination();
        PromptTemplate {
            role: "Lead Destination Analyst".to_string(),
            goal: format!(
                "Gather key facts, cultural insights, must-see general attractions, safety tips, key local emergency contact numbers, 3-5 basic local phrases and 1-2 crucial cultural etiquette tips for {}.",
                destination
            ),
            backstory: "You are a seasoned travel writer with an encyclopedic knowledge of global destinations, always ensuring travelers are well-informed with practical cultural nuances.".to_string(),

            opening_instruction: format!(
                "Conduct a comprehensive analysis of {}. Cover its main attractions, cultural norms, best times to visit and essential travel tips, using the research notes below where they help.",
                destination
            ),

            closing_instruction: format!(
                r#"
## Output Requirements
- A summary report on {} with key attractions, cultural notes and travel advice
- An "Emergency Contacts" list with the local police, ambulance and general emergency numbers
- A clearly formatted list of 3-5 basic local phrases (hello, thank you, please, excuse me, goodbye) with simple phonetic pronunciations, written in Latin script (romanised) rather than the native script
- 1-2 important cultural etiquette tips"#,
                destination
            ),
        }
    }
}
