//! coachctl - command-line entry point for the telemetry analysis core.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use model::{AnalysisError, ConsistencyThresholds, CoachingPayload, Preset, Result};
use tokio_util::sync::CancellationToken;
use track_store::TrackStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coachctl")]
#[command(about = "Extracts per-corner coaching data from a telemetry capture file")]
#[command(version)]
struct Cli {
    /// Path to the vendor binary telemetry capture file
    capture: PathBuf,

    /// Path to the persisted track store (SQLite); created if missing
    #[arg(long, env = "COACHCTL_TRACK_STORE", default_value = "track_store.sqlite3")]
    track_store: PathBuf,

    /// Force a corner-detector preset instead of deriving it from the
    /// track's stored `track_type`
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Standard-deviation threshold (s) above which a corner is flagged
    /// as a consistency issue rather than a technique issue
    #[arg(long, default_value_t = ConsistencyThresholds::default().std_dev_s)]
    consistency_std_dev_s: f64,

    /// Mean-delta threshold (s) above which a low-variance corner is
    /// flagged as a technique issue
    #[arg(long, default_value_t = ConsistencyThresholds::default().mean_delta_s)]
    consistency_mean_delta_s: f64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Road,
    Street,
    Oval,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Road => Preset::Road,
            PresetArg::Street => Preset::Street,
            PresetArg::Oval => Preset::Oval,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(payload) => match serde_json::to_string_pretty(&payload) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialise coaching payload");
                ExitCode::from(1)
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<CoachingPayload> {
    let bytes = std::fs::read(&cli.capture)
        .map_err(|e| AnalysisError::MalformedCapture(format!("reading {}: {e}", cli.capture.display())))?;
    let store = TrackStore::open(&cli.track_store)?;
    let thresholds =
        ConsistencyThresholds { std_dev_s: cli.consistency_std_dev_s, mean_delta_s: cli.consistency_mean_delta_s };
    let cancel = CancellationToken::new();
    analysis::analyse(&bytes, &store, cli.preset.map(Preset::from), thresholds, &cancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_arg_maps_to_model_preset() {
        assert!(matches!(Preset::from(PresetArg::Road), Preset::Road));
        assert!(matches!(Preset::from(PresetArg::Street), Preset::Street));
        assert!(matches!(Preset::from(PresetArg::Oval), Preset::Oval));
    }
}
