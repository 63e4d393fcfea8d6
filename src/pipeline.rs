//! Event-level OPR calculation: fetch, normalize, estimate, report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::OprError;
use crate::opr::{compute_opr, GameRecord, RatingMap, TeamId, WeightingPolicy};
use crate::providers::{
    normalize_all, MatchSource, Provider, ProviderSchema, ScorePolicy, TbaSeasonFields,
};

/// One calculation request. Event key and credential are always explicit.
#[derive(Debug, Clone)]
pub struct OprRequest {
    pub provider: Provider,
    pub event_key: String,
    /// Falls back to the configured key for the provider when absent or blank.
    pub api_key: Option<String>,
    pub weighting: WeightingPolicy,
}

/// All three ratings of one team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRatings {
    pub team: TeamId,
    pub total: f64,
    pub teleop: f64,
    pub auto: f64,
}

/// Ratings for one event under the three score policies.
#[derive(Debug, Clone, Serialize)]
pub struct EventRatings {
    pub provider: Provider,
    pub event_key: String,
    pub weighting: WeightingPolicy,
    pub total: RatingMap,
    pub auto: RatingMap,
    pub teleop: RatingMap,
    pub computed_at: DateTime<Utc>,
}

impl EventRatings {
    /// Teams of the total map, best total rating first. A team missing from
    /// the auto or teleop map is shown with 0.
    pub fn rows(&self) -> Vec<TeamRatings> {
        let mut rows: Vec<TeamRatings> = self
            .total
            .iter()
            .map(|(team, &total)| TeamRatings {
                team: team.clone(),
                total,
                teleop: self.teleop.get(team).copied().unwrap_or(0.0),
                auto: self.auto.get(team).copied().unwrap_or(0.0),
            })
            .collect();
        rows.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.team.cmp(&b.team)));
        rows
    }

    pub fn report_lines(&self) -> Vec<String> {
        self.rows()
            .iter()
            .map(|r| {
                format!(
                    "Team {}: totalOPR = {:.2}, teleopOPR = {:.2}, autoOPR = {:.2}",
                    r.team, r.total, r.teleop, r.auto
                )
            })
            .collect()
    }

    pub fn report(&self) -> String {
        self.report_lines().join("\n")
    }
}

/// Runs the full pipeline against the configured match sources.
pub struct OprCalculator {
    sources: HashMap<Provider, Arc<dyn MatchSource>>,
    api_keys: HashMap<Provider, String>,
    season: TbaSeasonFields,
}

impl OprCalculator {
    pub fn new(season: TbaSeasonFields) -> Self {
        OprCalculator {
            sources: HashMap::new(),
            api_keys: HashMap::new(),
            season,
        }
    }

    /// Register a source, optionally with a default API key for it.
    pub fn with_source(mut self, source: Arc<dyn MatchSource>, api_key: Option<String>) -> Self {
        let provider = source.provider();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_keys.insert(provider, key);
        }
        self.sources.insert(provider, source);
        self
    }

    pub async fn calculate(&self, req: &OprRequest) -> Result<EventRatings> {
        let source = self
            .sources
            .get(&req.provider)
            .with_context(|| format!("No match source configured for {}", req.provider))?;

        let api_key = req
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_keys.get(&req.provider).map(String::as_str))
            .with_context(|| format!("An API key is required for {}", source.name()))?;

        let matches = source.fetch_matches(&req.event_key, api_key).await?;
        info!(
            "Fetched {} matches for {} from {}",
            matches.len(),
            req.event_key,
            source.name()
        );

        let schema = ProviderSchema::for_provider(req.provider, &self.season);
        let games = normalize_all(&matches, &schema);
        for policy in ScorePolicy::ALL {
            info!(
                policy = policy.label(),
                games = games.get(policy).len(),
                "Normalized qualification games"
            );
        }

        let (total, auto, teleop) = tokio::try_join!(
            estimate(games.total, req.weighting, ScorePolicy::Total),
            estimate(games.auto, req.weighting, ScorePolicy::Auto),
            estimate(games.teleop, req.weighting, ScorePolicy::Teleop),
        )?;

        info!(
            "Computed OPR for {} teams at {} ({})",
            total.len(),
            req.event_key,
            if req.weighting.is_weighted() { "weighted" } else { "unweighted" }
        );

        Ok(EventRatings {
            provider: req.provider,
            event_key: req.event_key.trim().to_string(),
            weighting: req.weighting,
            total,
            auto,
            teleop,
            computed_at: Utc::now(),
        })
    }
}

/// Solve one game list on the blocking pool.
///
/// Only the total list must be non-empty. An event without auto or teleop
/// breakdowns still gets total ratings, with empty sub-rating maps.
async fn estimate(
    games: Vec<GameRecord>,
    weighting: WeightingPolicy,
    policy: ScorePolicy,
) -> Result<RatingMap> {
    let result = tokio::task::spawn_blocking(move || compute_opr(&games, &weighting))
        .await
        .context("OPR task failed")?;

    match result {
        Err(OprError::EmptyInput) if policy != ScorePolicy::Total => {
            warn!(policy = policy.label(), "No usable scores, sub-ratings left empty");
            Ok(RatingMap::new())
        }
        other => other.with_context(|| format!("Cannot compute {} OPR", policy.label())),
    }
}
