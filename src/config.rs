use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;

use crate::opr::WeightingPolicy;
use crate::providers::{Provider, TbaSeasonFields};

/// Offensive Power Rating calculator for FRC and FTC events
#[derive(Parser, Debug, Clone)]
#[command(name = "opr-calc", version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// The Blue Alliance API base URL
    #[arg(
        long,
        env = "TBA_API_URL",
        default_value = "https://www.thebluealliance.com/api/v3"
    )]
    pub tba_api_url: String,

    /// The Orange Alliance API base URL
    #[arg(long, env = "TOA_API_URL", default_value = "https://theorangealliance.org/api")]
    pub toa_api_url: String,

    /// The Blue Alliance read key, used when none is entered
    #[arg(long, env = "TBA_API_KEY")]
    pub tba_api_key: Option<String>,

    /// The Orange Alliance key, used when none is entered
    #[arg(long, env = "TOA_API_KEY")]
    pub toa_api_key: Option<String>,

    /// Match weighting: `linear` favours recent matches, `none` weighs all equally
    #[arg(long, env = "OPR_WEIGHTING", value_enum, default_value = "linear")]
    pub weighting: WeightingMode,

    /// Weight of the first match under linear weighting
    #[arg(long, env = "OPR_WEIGHT_MIN", default_value = "1.0")]
    pub weight_min: f64,

    /// Weight of the last match under linear weighting
    #[arg(long, env = "OPR_WEIGHT_MAX", default_value = "3.0")]
    pub weight_max: f64,

    /// FRC score-breakdown field holding autonomous points
    #[arg(long, env = "TBA_AUTO_FIELD", default_value = "autoPoints")]
    pub tba_auto_field: String,

    /// FRC score-breakdown field holding teleop points (season specific)
    #[arg(long, env = "TBA_TELEOP_FIELD", default_value = "teleopCoralPoints")]
    pub tba_teleop_field: String,

    /// FRC score-breakdown field holding foul points awarded to the alliance
    #[arg(long, env = "TBA_FOUL_FIELD", default_value = "foulPoints")]
    pub tba_foul_field: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Calculator page listen address (`serve`)
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ask for game type, event key and API key interactively (default)
    Prompt,
    /// Compute ratings for one event and print the report
    Calc {
        /// FRC (The Blue Alliance) or FTC (The Orange Alliance)
        #[arg(long, value_enum)]
        game: Provider,
        /// Event key, e.g. 2025paca
        #[arg(long)]
        event: String,
        /// API key; falls back to TBA_API_KEY / TOA_API_KEY
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Serve the calculator web page
    Serve,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingMode {
    None,
    Linear,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.weighting == WeightingMode::Linear {
            if !(self.weight_min > 0.0 && self.weight_min.is_finite()) {
                anyhow::bail!("weight_min must be positive");
            }
            if !(self.weight_max >= self.weight_min && self.weight_max.is_finite()) {
                anyhow::bail!("weight_max must be at least weight_min");
            }
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        for (name, field) in [
            ("tba_auto_field", &self.tba_auto_field),
            ("tba_teleop_field", &self.tba_teleop_field),
            ("tba_foul_field", &self.tba_foul_field),
        ] {
            if field.trim().is_empty() || field.contains('.') {
                anyhow::bail!("{} must be a single field name", name);
            }
        }
        Ok(())
    }

    pub fn weighting_policy(&self) -> WeightingPolicy {
        match self.weighting {
            WeightingMode::None => WeightingPolicy::Uniform,
            WeightingMode::Linear => WeightingPolicy::Linear {
                min: self.weight_min,
                max: self.weight_max,
            },
        }
    }

    pub fn season_fields(&self) -> TbaSeasonFields {
        TbaSeasonFields {
            auto: self.tba_auto_field.trim().to_string(),
            teleop: self.tba_teleop_field.trim().to_string(),
            foul: self.tba_foul_field.trim().to_string(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
