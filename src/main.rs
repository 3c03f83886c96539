mod config;   // brings `config.rs` in as `crate::config`
mod scenario; // brings `scenario.rs` in as `crate::scenario`

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

use crate::config::{DEFAULT_CONFIG_PATH, RunMode};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let context = crate::config::load_context(&path)
        .with_context(|| format!("failed to load simulation context from {path}"))?;

    info!(mode = ?context.run.mode, path = ?context.path.kind, "Steering simulation started");

    match context.run.mode {
        RunMode::Follow => {
            let summary = scenario::run_follow(&context)?;
            info!(%summary, "Follow run finished");
        }
        RunMode::TurningRadius => {
            let samples = scenario::run_turning_radius(&context)?;
            for s in &samples {
                info!(
                    angle_deg = s.steering_angle.to_degrees(),
                    analytic = s.analytic_radius,
                    measured = s.measured_radius,
                    "Turning radius"
                );
            }
            info!(samples = samples.len(), "Turning radius sweep finished");
        }
    }

    Ok(())
}
