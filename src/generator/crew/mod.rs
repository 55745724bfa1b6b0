//! 四阶段行程规划团队：目的地分析 → 活动调研 → 花费估算 → 行程合成

use serde::Serialize;
use uuid::Uuid;

use crate::error::PlannerResult;
use crate::generator::context::CrewContext;
use crate::generator::crew::orchestrator::CrewOrchestrator;
use crate::generator::pipeline::PipelineRun;
use crate::generator::types::AgentTask;
use crate::types::{CostEstimate, Itinerary, TripRequest};

pub mod agents;
pub mod orchestrator;

/// 一次成功运行的产出
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub run_id: Uuid,
    pub itinerary: Itinerary,
    pub cost_estimate: CostEstimate,
    /// 各阶段的执行记录，按执行顺序排列
    pub tasks: Vec<AgentTask>,
}

/// 行程规划团队
#[derive(Default)]
pub struct TravelCrew {
    orchestrator: CrewOrchestrator,
}

impl TravelCrew {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为行程请求执行完整的流水线
    pub async fn run(
        &self,
        context: &CrewContext,
        request: &TripRequest,
    ) -> PlannerResult<CrewOutput> {
        let mut run = PipelineRun::new();
        self.execute(context, request, &mut run).await
    }

    /// 在给定的运行状态上执行流水线，调用方可在结束后检查状态与耗时
    pub async fn execute(
        &self,
        context: &CrewContext,
        request: &TripRequest,
        run: &mut PipelineRun,
    ) -> PlannerResult<CrewOutput> {
        self.orchestrator.execute_pipeline(context, request, run).await
    }
}
