use crate::event;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Progress of one analysis run.
///
/// `Unmatched`, `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum PipelineStage {
    Received,
    Matched,
    /// No flight/scene pairing; the run ends with a warning instead of an error.
    Unmatched,
    Segmented,
    EmissionComputed,
    Priced,
    StrategyEvaluated,
    Completed,
    /// The run failed in the preceding stage.
    Failed(String),
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Unmatched | PipelineStage::Completed | PipelineStage::Failed(_))
    }

    /// Checks whether `next` may follow `self`. Every non-terminal stage may fail.
    pub fn can_transition_to(&self, next: &PipelineStage) -> bool {
        use PipelineStage::{
            Completed, EmissionComputed, Failed, Matched, Priced, Received, Segmented,
            StrategyEvaluated, Unmatched,
        };
        match (self, next) {
            (from, Failed(_)) => !from.is_terminal(),
            (Received, Matched | Unmatched)
            | (Matched, Segmented)
            | (Segmented, EmissionComputed)
            | (EmissionComputed, Priced)
            | (Priced, StrategyEvaluated | Completed)
            | (StrategyEvaluated, Completed) => true,
            _ => false,
        }
    }
}

/// Ordered record of the stages one run went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Label of the run, used in log lines.
    label: String,
    stages: Vec<PipelineStage>,
}

impl StageTrace {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), stages: vec![PipelineStage::Received] }
    }

    pub fn current(&self) -> &PipelineStage {
        // constructed with `Received` and never shrinks
        &self.stages[self.stages.len() - 1]
    }

    pub fn stages(&self) -> &[PipelineStage] { &self.stages }

    /// Moves to `next`.
    ///
    /// # Errors
    /// Returns `(from, to)` if the transition is illegal; the trace is unchanged.
    pub fn advance(&mut self, next: PipelineStage) -> Result<(), (PipelineStage, PipelineStage)> {
        let from = self.current().clone();
        if !from.can_transition_to(&next) {
            return Err((from, next));
        }
        event!("[{}] {from} -> {next}", self.label);
        self.stages.push(next);
        Ok(())
    }

    /// Records a failure unless the run already ended.
    pub fn fail(&mut self, reason: impl Into<String>) {
        // a terminal trace keeps its final stage
        self.advance(PipelineStage::Failed(reason.into())).ok();
    }
}
