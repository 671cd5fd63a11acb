//! One request -> result transaction over matching, segmentation, emission, pricing and strategy.

mod analysis_pipeline;
mod request;
mod stage;


pub use analysis_pipeline::{AnalysisError, AnalysisPipeline};
pub use request::{
    AnalysisReport, AnalysisRequest, AnalysisResponse, MatchPolicy, MatchSummary, StrategyRequest,
};
pub use stage::{PipelineStage, StageTrace};
