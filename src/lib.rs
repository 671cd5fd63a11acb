//! Contrail detection, CO2-equivalent emission accounting and carbon-market cost
//! optimisation for satellite-observed flights.
//!
//! [`pipeline::AnalysisPipeline`] is the entry point; the remaining modules are usable
//! on their own.
#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod logger;
pub mod config;
pub mod emission;
pub mod market;
pub mod matching;
pub mod pipeline;
pub mod segmentation;
pub mod strategy;
pub mod util;
