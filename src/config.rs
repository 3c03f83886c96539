use ::config::{
    Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState,
};
use serde::Deserialize;
use steer_control::{NoTargetPolicy, PidGains, SteeringMode};
use steer_kinematics::RearCoupling;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "STEER_SIM";

/// Everything a run needs, passed explicitly instead of living in globals.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct SimulationContext {
    pub run: RunSettings,
    pub vehicle: VehicleSettings,
    pub controller: ControllerSettings,
    pub path: PathSettings,
    pub tracking: TrackingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Follow,
    TurningRadius,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub mode: RunMode,
    pub dt: f64,
    pub steps: usize,
    pub log_every: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            mode: RunMode::Follow,
            dt: 1.0 / 60.0,
            steps: 1200,
            log_every: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SteeringModeSetting {
    #[default]
    Bicycle,
    FourWheel,
}

impl From<SteeringModeSetting> for SteeringMode {
    fn from(setting: SteeringModeSetting) -> Self {
        match setting {
            SteeringModeSetting::Bicycle => SteeringMode::Bicycle,
            SteeringModeSetting::FourWheel => SteeringMode::FourWheel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RearCouplingSetting {
    #[default]
    None,
    Fixed {
        ratio: f64,
    },
    VelocityPhased {
        threshold: f64,
        low_speed_ratio: f64,
        high_speed_ratio: f64,
    },
}

impl From<RearCouplingSetting> for RearCoupling {
    fn from(setting: RearCouplingSetting) -> Self {
        match setting {
            RearCouplingSetting::None => RearCoupling::None,
            RearCouplingSetting::Fixed { ratio } => RearCoupling::Fixed(ratio),
            RearCouplingSetting::VelocityPhased {
                threshold,
                low_speed_ratio,
                high_speed_ratio,
            } => RearCoupling::VelocityPhased {
                threshold,
                low_speed_ratio,
                high_speed_ratio,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    pub wheelbase: f64,
    pub track_width: f64,
    pub max_steering_angle_deg: f64,
    pub velocity: f64,
    pub steering_mode: SteeringModeSetting,
    pub rear_coupling: RearCouplingSetting,
    /// Start position and heading; derived from the path when unset.
    pub start_x: Option<f64>,
    pub start_y: Option<f64>,
    pub start_heading_deg: Option<f64>,
}

impl Default for VehicleSettings {
    fn default() -> Self {
        VehicleSettings {
            wheelbase: 50.0,
            track_width: 20.0,
            max_steering_angle_deg: 30.0,
            velocity: 30.0,
            steering_mode: SteeringModeSetting::Bicycle,
            rear_coupling: RearCouplingSetting::None,
            start_x: None,
            start_y: None,
            start_heading_deg: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: Option<f64>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            kp: 0.1,
            ki: 0.0,
            kd: 0.01,
            integral_limit: None,
        }
    }
}

impl ControllerSettings {
    pub fn gains(&self) -> PidGains {
        PidGains::new(self.kp, self.ki, self.kd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    #[default]
    Circle,
    Square,
    Random,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub kind: PathKind,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub point_count: usize,
    pub side_length: f64,
    pub segment_count: usize,
    pub segment_length: f64,
    /// Seed for the random walk; entropy from the OS when unset.
    pub seed: Option<u64>,
}

impl Default for PathSettings {
    fn default() -> Self {
        PathSettings {
            kind: PathKind::Circle,
            center_x: 400.0,
            center_y: 300.0,
            radius: 100.0,
            point_count: 100,
            side_length: 200.0,
            segment_count: 10,
            segment_length: 50.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStrategy {
    CrossTrack,
    PurePursuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoTargetSetting {
    #[default]
    Hold,
    Zero,
}

impl From<NoTargetSetting> for NoTargetPolicy {
    fn from(setting: NoTargetSetting) -> Self {
        match setting {
            NoTargetSetting::Hold => NoTargetPolicy::HoldSteering,
            NoTargetSetting::Zero => NoTargetPolicy::ZeroError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Cross-track for circles and pure pursuit otherwise, when unset.
    pub strategy: Option<TrackingStrategy>,
    pub lookahead: f64,
    pub no_target_policy: NoTargetSetting,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        TrackingSettings {
            strategy: None,
            lookahead: 30.0,
            no_target_policy: NoTargetSetting::Hold,
        }
    }
}

impl TrackingSettings {
    pub fn strategy_for(&self, kind: PathKind) -> TrackingStrategy {
        self.strategy.unwrap_or(match kind {
            PathKind::Circle => TrackingStrategy::CrossTrack,
            PathKind::Square | PathKind::Random => TrackingStrategy::PurePursuit,
        })
    }
}

/// Load the context from a TOML file layered with `STEER_SIM__*` environment variables.
///
/// The default path may be missing, in which case built-in defaults apply.
pub fn load_context(path: &str) -> Result<SimulationContext, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let builder = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(path != DEFAULT_CONFIG_PATH));

    match finish(builder) {
        Ok(context) => {
            info!("Successfully loaded configuration: {:?}", context);
            Ok(context)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SimulationContext, ConfigError> {
    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
