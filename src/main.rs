#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
use contrail_ledger::{
    config::CoreConfig,
    error, info,
    market::MarketQuote,
    pipeline::{AnalysisPipeline, AnalysisRequest, AnalysisResponse},
    segmentation::{ConvSegmentationModel, SegmentationModel},
    warn,
};
use std::{env, fs, path::Path, process::ExitCode, sync::Arc};

#[cfg(all(feature = "profiling", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const ENV_REQUEST: &str = "CONTRAIL_REQUEST_PATH";
const ENV_MODEL: &str = "CONTRAIL_MODEL_PATH";
const ENV_REPORT: &str = "CONTRAIL_REPORT_PATH";

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> ExitCode {
    let config = match CoreConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Ok(request_path) = env::var(ENV_REQUEST) else {
        error!("{ENV_REQUEST} is not set");
        return ExitCode::FAILURE;
    };
    let request = match read_request(&request_path) {
        Ok(request) => request,
        Err(e) => {
            error!("Could not read request {request_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let model: Arc<dyn SegmentationModel> = match env::var(ENV_MODEL) {
        Ok(path) => match ConvSegmentationModel::load(&path) {
            Ok(model) => Arc::new(model),
            Err(e) => {
                error!("Could not load model weights {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => {
            let (width, height) = request.scenes.first().map_or((1, 1), |s| s.bands().dimensions());
            warn!("{ENV_MODEL} is not set, using the reference line detector ({width}x{height})");
            Arc::new(ConvSegmentationModel::reference(height, width))
        }
    };

    let pipeline = AnalysisPipeline::new(config, model);
    let response = match pipeline.analyze(request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Analysis aborted: {e}");
            return ExitCode::FAILURE;
        }
    };
    match &response {
        AnalysisResponse::Completed(report) => {
            info!(
                "{} on {}: {:.1} kg CO2-eq, {:.2} {} on {}",
                report.flight_id,
                report.scene_id,
                report.emission.co2_total_kg(),
                report.quote.total_cost(),
                MarketQuote::CURRENCY,
                report.quote.market()
            );
            if let Some(cheapest) = report.comparison.cheapest() {
                info!(
                    "Cheapest market: {} at {:.2} {}",
                    cheapest.market(),
                    cheapest.total_cost(),
                    MarketQuote::CURRENCY
                );
            }
        }
        AnalysisResponse::Unmatched { flight_id, warning } => warn!("{flight_id}: {warning}"),
    }
    if let Ok(path) = env::var(ENV_REPORT) {
        if let Err(e) = write_response(&path, &response) {
            error!("Could not write report {path}: {e}");
            return ExitCode::FAILURE;
        }
        info!("Report written to {path}");
    }
    ExitCode::SUCCESS
}

fn read_request(path: impl AsRef<Path>) -> Result<AnalysisRequest, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let (request, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(request)
}

fn write_response(path: impl AsRef<Path>, response: &AnalysisResponse) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = bincode::serde::encode_to_vec(response, bincode::config::standard())?;
    fs::write(path, bytes)?;
    Ok(())
}
