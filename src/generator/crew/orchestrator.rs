use tracing::{debug, info};

use crate::error::{PlannerError, PlannerResult};
use crate::generator::context::CrewContext;
use crate::generator::crew::CrewOutput;
use crate::generator::crew::agents::{
    ActivityResearcher, CostEstimator, DestinationAnalyst, Synthesizer,
};
use crate::generator::parser::{parse_cost_estimate, parse_itinerary};
use crate::generator::pipeline::PipelineRun;
use crate::generator::step_forward_agent::StepForwardAgent;
use crate::generator::types::{AgentTask, Artifact};
use crate::types::TripRequest;

/// 多智能体编排器，严格按顺序执行，任一阶段失败即终止
#[derive(Default)]
pub struct CrewOrchestrator;

impl CrewOrchestrator {
    /// 执行所有智能体的规划流程
    pub async fn execute_pipeline(
        &self,
        context: &CrewContext,
        request: &TripRequest,
        run: &mut PipelineRun,
    ) -> PlannerResult<CrewOutput> {
        let max_days = context.config.max_trip_days;
        if request.duration_days() > max_days {
            return Err(PlannerError::InvalidRequest(format!(
                "行程共{}天，超过上限{}天",
                request.duration_days(),
                max_days
            )));
        }

        info!(target: "crew", run_id = %run.run_id(), destination = %request.destination(), days = request.duration_days(), "pipeline started");
        println!(
            "🚀 开始为 {} 规划 {} 的行程...",
            request.destination(),
            request.duration_label()
        );

        let mut artifacts: Vec<Artifact> = Vec::with_capacity(4);
        let mut tasks: Vec<AgentTask> = Vec::with_capacity(4);

        self.execute_agent(&DestinationAnalyst, context, request, run, &mut artifacts, &mut tasks)
            .await?;
        self.execute_agent(&ActivityResearcher, context, request, run, &mut artifacts, &mut tasks)
            .await?;
        self.execute_agent(&CostEstimator, context, request, run, &mut artifacts, &mut tasks)
            .await?;
        self.execute_agent(&Synthesizer, context, request, run, &mut artifacts, &mut tasks)
            .await?;

        // 合成结果解析失败同样视为合成阶段失败
        let parsed = parse_cost_estimate(&artifacts[2].content, &context.config.currency)
            .and_then(|cost_estimate| {
                parse_itinerary(
                    &artifacts[3].content,
                    request,
                    &cost_estimate,
                    context.config.map.max_locations,
                )
                .map(|itinerary| (cost_estimate, itinerary))
            });
        let (cost_estimate, itinerary) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                run.fail()?;
                eprintln!("❌ 行程解析失败: {}", err);
                return Err(err);
            }
        };

        run.complete()?;
        println!("✓ 行程规划流程执行完毕");
        debug!(target: "crew", run_id = %run.run_id(), "{}", run.timing().generate_timing_report());

        Ok(CrewOutput {
            run_id: run.run_id(),
            itinerary,
            cost_estimate,
            tasks,
        })
    }

    /// 执行单个智能体，输入为此前所有阶段的产出
    async fn execute_agent<T>(
        &self,
        agent: &T,
        context: &CrewContext,
        request: &TripRequest,
        run: &mut PipelineRun,
        artifacts: &mut Vec<Artifact>,
        tasks: &mut Vec<AgentTask>,
    ) -> PlannerResult<()>
    where
        T: StepForwardAgent,
    {
        let role = agent.role();
        run.begin_stage(role)?;
        println!("🤖 [{}/4] 执行 {} 智能体...", role.stage_number(), role);

        match agent.execute(context, request, artifacts).await {
            Ok(artifact) => {
                tasks.push(AgentTask {
                    role,
                    input_context: artifacts.clone(),
                    output: artifact.content.clone(),
                });
                artifacts.push(artifact);
                println!("✓ {} 执行完成", role);
                Ok(())
            }
            Err(err) => {
                run.fail()?;
                eprintln!("❌ {} 执行失败: {}", role, err);
                Err(err)
            }
        }
    }
}
