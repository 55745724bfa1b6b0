use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 智能体角色，按流水线执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    DestinationAnalyst,
    ActivityResearcher,
    CostEstimator,
    Synthesizer,
}

impl AgentRole {
    /// 固定的执行顺序
    pub const ORDER: [AgentRole; 4] = [
        AgentRole::DestinationAnalyst,
        AgentRole::ActivityResearcher,
        AgentRole::CostEstimator,
        AgentRole::Synthesizer,
    ];

    /// 阶段序号，从1开始
    pub fn stage_number(&self) -> usize {
        match self {
            AgentRole::DestinationAnalyst => 1,
            AgentRole::ActivityResearcher => 2,
            AgentRole::CostEstimator => 3,
            AgentRole::Synthesizer => 4,
        }
    }

    pub fn next(&self) -> Option<AgentRole> {
        Self::ORDER.get(self.stage_number()).copied()
    }
}

impl Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentRole::DestinationAnalyst => "DestinationAnalyst",
            AgentRole::ActivityResearcher => "ActivityResearcher",
            AgentRole::CostEstimator => "CostEstimator",
            AgentRole::Synthesizer => "Synthesizer",
        };
        write!(f, "{}", str)
    }
}

/// 单个阶段的文本产出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub role: AgentRole,
    pub content: String,
}

/// 一次阶段执行的记录：输入上下文为此前所有阶段的产出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub role: AgentRole,
    pub input_context: Vec<Artifact>,
    pub output: String,
}
