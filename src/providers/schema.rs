//! Field layouts of the upstream match providers.
//!
//! A [`ProviderSchema`] describes where one provider keeps the data the
//! normalizer needs: how to recognise a qualification match, how to read the
//! two alliances, and which fields hold each score. Field paths are dotted
//! JSON paths in which `{color}` is replaced by `blue` or `red`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::OprError;

/// Upstream data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Provider {
    /// The Blue Alliance (FRC).
    #[value(name = "FRC", aliases = ["frc", "tba"])]
    #[serde(rename = "FRC")]
    Tba,
    /// The Orange Alliance (FTC).
    #[value(name = "FTC", aliases = ["ftc", "toa"])]
    #[serde(rename = "FTC")]
    Toa,
}

impl Provider {
    /// Parse the game type a user typed, e.g. `"FRC"` or `"ftc"`.
    pub fn from_game_type(s: &str) -> Result<Self, OprError> {
        match s.trim().to_uppercase().as_str() {
            "FRC" => Ok(Provider::Tba),
            "FTC" => Ok(Provider::Toa),
            _ => Err(OprError::UnknownGameType {
                value: s.trim().to_string(),
            }),
        }
    }

    pub fn game_type(&self) -> &'static str {
        match self {
            Provider::Tba => "FRC",
            Provider::Toa => "FTC",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Tba => "TheBlueAlliance",
            Provider::Toa => "TheOrangeAlliance",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.game_type())
    }
}

/// Which score a game list is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScorePolicy {
    /// Alliance score minus the penalty points it received.
    Total,
    /// Autonomous-period points.
    Auto,
    /// Driver-controlled-period points.
    Teleop,
}

impl ScorePolicy {
    pub const ALL: [ScorePolicy; 3] = [ScorePolicy::Total, ScorePolicy::Auto, ScorePolicy::Teleop];

    pub fn label(&self) -> &'static str {
        match self {
            ScorePolicy::Total => "total",
            ScorePolicy::Auto => "auto",
            ScorePolicy::Teleop => "teleop",
        }
    }
}

/// Alliance color. Blue is side A, red is side B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Blue,
    Red,
}

impl Color {
    pub fn key(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Red => "red",
        }
    }
}

/// Dotted JSON path, optionally containing a `{color}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        FieldPath(path.into())
    }

    /// Concrete path for one alliance, e.g. `score_breakdown.red.autoPoints`.
    pub fn for_color(&self, color: Color) -> String {
        self.0.replace("{color}", color.key())
    }

    /// Look the path up in a match object. Missing or `null` yields an error.
    pub fn resolve<'a>(&self, value: &'a Value, color: Color) -> Result<&'a Value, OprError> {
        let path = self.for_color(color);
        let mut cur = value;
        for segment in path.split('.') {
            cur = match cur.get(segment) {
                Some(v) if !v.is_null() => v,
                _ => return Err(OprError::SchemaMismatch { field: path.clone() }),
            };
        }
        Ok(cur)
    }
}

/// How a match is recognised as a qualification match.
#[derive(Debug, Clone, PartialEq)]
pub struct QualificationRule {
    pub field: FieldPath,
    pub value: Value,
}

/// How the two alliances are read.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamRule {
    /// One list of team keys per alliance, each key carrying a league prefix.
    KeyLists { path: FieldPath, prefix: String },
    /// One flat participant list; the station number decides the alliance.
    Stations {
        list: String,
        station_field: String,
        team_field: String,
        blue: Vec<i64>,
        red: Vec<i64>,
    },
}

/// How one alliance score is computed from raw fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreRule {
    Field(FieldPath),
    /// `minuend - subtrahend`, both read for the same alliance.
    Difference { minuend: FieldPath, subtrahend: FieldPath },
}

/// Season-specific FRC score-breakdown field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbaSeasonFields {
    pub auto: String,
    pub teleop: String,
    pub foul: String,
}

impl Default for TbaSeasonFields {
    /// 2025 (REEFSCAPE) breakdown.
    fn default() -> Self {
        TbaSeasonFields {
            auto: "autoPoints".to_string(),
            teleop: "teleopCoralPoints".to_string(),
            foul: "foulPoints".to_string(),
        }
    }
}

/// Complete field layout for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSchema {
    pub provider: Provider,
    pub qualification: QualificationRule,
    pub teams: TeamRule,
    pub total: ScoreRule,
    pub auto: ScoreRule,
    pub teleop: ScoreRule,
    /// Raw value meaning "no data" (unplayed match or missing breakdown).
    pub sentinel: f64,
}

impl ProviderSchema {
    /// The Blue Alliance v3 `event/{key}/matches` layout.
    pub fn tba(season: &TbaSeasonFields) -> Self {
        let breakdown = |field: &str| FieldPath::new(format!("score_breakdown.{{color}}.{}", field));
        ProviderSchema {
            provider: Provider::Tba,
            qualification: QualificationRule {
                field: FieldPath::new("comp_level"),
                value: Value::from("qm"),
            },
            teams: TeamRule::KeyLists {
                path: FieldPath::new("alliances.{color}.team_keys"),
                prefix: "frc".to_string(),
            },
            total: ScoreRule::Difference {
                minuend: FieldPath::new("alliances.{color}.score"),
                subtrahend: breakdown(&season.foul),
            },
            auto: ScoreRule::Field(breakdown(&season.auto)),
            teleop: ScoreRule::Field(breakdown(&season.teleop)),
            sentinel: -1.0,
        }
    }

    /// The Orange Alliance `event/{key}/matches` layout.
    pub fn toa() -> Self {
        ProviderSchema {
            provider: Provider::Toa,
            qualification: QualificationRule {
                field: FieldPath::new("tournament_level"),
                value: Value::from(1),
            },
            teams: TeamRule::Stations {
                list: "participants".to_string(),
                station_field: "station".to_string(),
                team_field: "team_key".to_string(),
                blue: vec![21, 22, 23],
                red: vec![11, 12, 13],
            },
            total: ScoreRule::Difference {
                minuend: FieldPath::new("{color}_score"),
                subtrahend: FieldPath::new("{color}_penalty"),
            },
            auto: ScoreRule::Field(FieldPath::new("{color}_auto_score")),
            teleop: ScoreRule::Field(FieldPath::new("{color}_tele_score")),
            sentinel: -1.0,
        }
    }

    pub fn for_provider(provider: Provider, season: &TbaSeasonFields) -> Self {
        match provider {
            Provider::Tba => ProviderSchema::tba(season),
            Provider::Toa => ProviderSchema::toa(),
        }
    }

    pub fn score_rule(&self, policy: ScorePolicy) -> &ScoreRule {
        match policy {
            ScorePolicy::Total => &self.total,
            ScorePolicy::Auto => &self.auto,
            ScorePolicy::Teleop => &self.teleop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_game_type_parsing() {
        assert_eq!(Provider::from_game_type("FRC").unwrap(), Provider::Tba);
        assert_eq!(Provider::from_game_type(" ftc ").unwrap(), Provider::Toa);
        assert!(matches!(
            Provider::from_game_type("VEX"),
            Err(OprError::UnknownGameType { .. })
        ));
    }

    #[test]
    fn test_field_path_resolves_per_color() {
        let m = json!({"score_breakdown": {"blue": {"autoPoints": 12}, "red": {"autoPoints": 7}}});
        let path = FieldPath::new("score_breakdown.{color}.autoPoints");
        assert_eq!(path.resolve(&m, Color::Blue).unwrap(), &json!(12));
        assert_eq!(path.resolve(&m, Color::Red).unwrap(), &json!(7));
    }

    #[test]
    fn test_field_path_missing_and_null() {
        let m = json!({"score_breakdown": null, "blue_score": 3});
        let err = FieldPath::new("score_breakdown.{color}.autoPoints")
            .resolve(&m, Color::Red)
            .unwrap_err();
        assert_eq!(
            err,
            OprError::SchemaMismatch {
                field: "score_breakdown.red.autoPoints".to_string()
            }
        );
        assert!(FieldPath::new("{color}_score").resolve(&m, Color::Red).is_err());
    }

    #[test]
    fn test_season_fields_flow_into_schema() {
        let season = TbaSeasonFields {
            auto: "autoPoints".to_string(),
            teleop: "teleopPoints".to_string(),
            foul: "foulPoints".to_string(),
        };
        let schema = ProviderSchema::tba(&season);
        assert_eq!(
            schema.score_rule(ScorePolicy::Teleop),
            &ScoreRule::Field(FieldPath::new("score_breakdown.{color}.teleopPoints"))
        );
    }
}
