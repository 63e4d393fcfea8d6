//! Raw provider matches -> canonical game records.
//!
//! Each score policy filters the same raw input independently: a match with
//! no autonomous breakdown drops out of the auto list only.

use serde_json::Value;
use tracing::debug;

use super::schema::{Color, FieldPath, ProviderSchema, ScorePolicy, ScoreRule, TeamRule};
use crate::error::OprError;
use crate::opr::{GameRecord, TeamId};

/// Game lists for the three score policies of one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedGames {
    pub total: Vec<GameRecord>,
    pub auto: Vec<GameRecord>,
    pub teleop: Vec<GameRecord>,
}

impl NormalizedGames {
    pub fn get(&self, policy: ScorePolicy) -> &[GameRecord] {
        match policy {
            ScorePolicy::Total => &self.total,
            ScorePolicy::Auto => &self.auto,
            ScorePolicy::Teleop => &self.teleop,
        }
    }
}

/// Build all three game lists from one event's matches.
pub fn normalize_all(matches: &[Value], schema: &ProviderSchema) -> NormalizedGames {
    let mut games = NormalizedGames::default();
    for policy in ScorePolicy::ALL {
        let list = normalize(matches, schema, policy);
        match policy {
            ScorePolicy::Total => games.total = list,
            ScorePolicy::Auto => games.auto = list,
            ScorePolicy::Teleop => games.teleop = list,
        }
    }
    games
}

/// Build the game list for one score policy, preserving match order.
///
/// Playoff matches, unplayed matches and matches missing a required field
/// are skipped.
pub fn normalize(matches: &[Value], schema: &ProviderSchema, policy: ScorePolicy) -> Vec<GameRecord> {
    let games: Vec<GameRecord> = matches
        .iter()
        .enumerate()
        .filter_map(|(i, m)| match extract_game(m, schema, policy) {
            Ok(game) => game,
            Err(e) => {
                debug!(
                    provider = schema.provider.name(),
                    policy = policy.label(),
                    index = i,
                    "Skipping match: {}",
                    e
                );
                None
            }
        })
        .collect();

    debug!(
        provider = schema.provider.name(),
        policy = policy.label(),
        "Normalized {} of {} matches",
        games.len(),
        matches.len()
    );
    games
}

/// `Ok(None)` means the match is valid but not usable for this policy.
fn extract_game(
    m: &Value,
    schema: &ProviderSchema,
    policy: ScorePolicy,
) -> Result<Option<GameRecord>, OprError> {
    if !is_qualification(m, schema)? {
        return Ok(None);
    }

    let blue = read_teams(m, &schema.teams, Color::Blue)?;
    let red = read_teams(m, &schema.teams, Color::Red)?;
    if blue.is_empty() || red.is_empty() {
        return Ok(None);
    }

    let rule = schema.score_rule(policy);
    let blue_score = read_score(m, rule, Color::Blue, schema.sentinel)?;
    let red_score = read_score(m, rule, Color::Red, schema.sentinel)?;

    match (blue_score, red_score) {
        (Some(b), Some(r)) => GameRecord::new(blue, red, b, r).map(Some),
        _ => Ok(None),
    }
}

fn is_qualification(m: &Value, schema: &ProviderSchema) -> Result<bool, OprError> {
    let rule = &schema.qualification;
    // The qualification field is match-level, so the color is irrelevant.
    let value = rule.field.resolve(m, Color::Blue)?;
    Ok(*value == rule.value)
}

fn read_teams(m: &Value, rule: &TeamRule, color: Color) -> Result<Vec<TeamId>, OprError> {
    match rule {
        TeamRule::KeyLists { path, prefix } => {
            let keys = path
                .resolve(m, color)?
                .as_array()
                .ok_or_else(|| OprError::SchemaMismatch {
                    field: path.for_color(color),
                })?;
            keys.iter()
                .map(|k| {
                    let key = team_key(k).ok_or_else(|| OprError::SchemaMismatch {
                        field: path.for_color(color),
                    })?;
                    Ok(TeamId::from(key.strip_prefix(prefix.as_str()).unwrap_or(&key)))
                })
                .collect()
        }
        TeamRule::Stations {
            list,
            station_field,
            team_field,
            blue,
            red,
        } => {
            let stations = match color {
                Color::Blue => blue,
                Color::Red => red,
            };
            let participants = match m.get(list).and_then(Value::as_array) {
                Some(p) => p,
                None => {
                    return Err(OprError::SchemaMismatch {
                        field: list.clone(),
                    })
                }
            };
            Ok(participants
                .iter()
                .filter(|p| {
                    p.get(station_field)
                        .and_then(Value::as_i64)
                        .is_some_and(|s| stations.contains(&s))
                })
                .filter_map(|p| p.get(team_field).and_then(team_key))
                .map(TeamId::new)
                .collect())
        }
    }
}

/// Team keys show up both as strings and as bare numbers.
fn team_key(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_score(
    m: &Value,
    rule: &ScoreRule,
    color: Color,
    sentinel: f64,
) -> Result<Option<f64>, OprError> {
    match rule {
        ScoreRule::Field(path) => read_number(m, path, color, sentinel),
        ScoreRule::Difference {
            minuend,
            subtrahend,
        } => {
            let a = read_number(m, minuend, color, sentinel)?;
            let b = read_number(m, subtrahend, color, sentinel)?;
            Ok(a.zip(b).map(|(a, b)| a - b))
        }
    }
}

/// Read a numeric field; the provider's "no data" sentinel yields `None`.
/// Non-finite values such as `"NaN"` or `"inf"` are a schema mismatch.
fn read_number(
    m: &Value,
    path: &FieldPath,
    color: Color,
    sentinel: f64,
) -> Result<Option<f64>, OprError> {
    let raw = path.resolve(m, color)?;
    let value = raw
        .as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| OprError::SchemaMismatch {
            field: path.for_color(color),
        })?;
    if value == sentinel {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}
