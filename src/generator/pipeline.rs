//! 流水线运行状态机

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{PlannerError, PlannerResult};
use crate::generator::types::AgentRole;

/// 流水线状态：NotStarted → Running(1..4) → Completed，任一阶段失败进入 Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running(AgentRole),
    Completed,
    Failed(AgentRole),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed(_))
    }

    /// 是否为合法的状态迁移
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        match (self, next) {
            (PipelineState::NotStarted, PipelineState::Running(role)) => {
                *role == AgentRole::DestinationAnalyst
            }
            (PipelineState::Running(current), PipelineState::Running(role)) => {
                current.next() == Some(*role)
            }
            (PipelineState::Running(AgentRole::Synthesizer), PipelineState::Completed) => true,
            (PipelineState::Running(current), PipelineState::Failed(role)) => current == role,
            _ => false,
        }
    }
}

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<AgentRole, Instant>,
    phase_durations: Vec<(AgentRole, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个阶段的计时
    pub fn start_phase(&mut self, role: AgentRole) {
        self.phase_start_times.insert(role, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, role: AgentRole) -> Option<Duration> {
        let duration = self.phase_start_times.remove(&role)?.elapsed();
        self.phase_durations.push((role, duration));
        Some(duration)
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_phase_durations(&self) -> &[(AgentRole, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (role, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", role, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 单次流水线运行，负责约束状态迁移并记录迁移历史
pub struct PipelineRun {
    run_id: Uuid,
    state: PipelineState,
    history: Vec<PipelineState>,
    timing: TimingScope,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: PipelineState::NotStarted,
            history: vec![PipelineState::NotStarted],
            timing: TimingScope::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// 迁移历史，包含初始状态
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn timing(&self) -> &TimingScope {
        &self.timing
    }

    fn transition(&mut self, next: PipelineState) -> PlannerResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(PlannerError::Pipeline(format!(
                "非法的状态迁移: {:?} -> {:?}",
                self.state, next
            )));
        }
        if let PipelineState::Running(current) = self.state {
            self.timing.end_phase(current);
        }
        if let PipelineState::Running(role) = next {
            self.timing.start_phase(role);
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// 进入指定阶段
    pub fn begin_stage(&mut self, role: AgentRole) -> PlannerResult<()> {
        self.transition(PipelineState::Running(role))
    }

    /// 所有阶段成功完成
    pub fn complete(&mut self) -> PlannerResult<()> {
        self.transition(PipelineState::Completed)
    }

    /// 当前阶段失败，进入终态
    pub fn fail(&mut self) -> PlannerResult<()> {
        match self.state {
            PipelineState::Running(role) => self.transition(PipelineState::Failed(role)),
            other => Err(PlannerError::Pipeline(format!(
                "状态 {:?} 下无法标记失败",
                other
            ))),
        }
    }
}
