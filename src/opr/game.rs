use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::OprError;

/// Opaque team key, e.g. `"254"` for FRC or `"16072"` for FTC.
///
/// Ordering is plain string ordering and is only used to make column
/// assignment deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        TeamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId::new(s)
    }
}

/// Alliance scores for one game, side A first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub a: f64,
    pub b: f64,
}

/// One scored contest between two alliances.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    side_a: BTreeSet<TeamId>,
    side_b: BTreeSet<TeamId>,
    scores: Scores,
}

impl GameRecord {
    /// Build a record, rejecting empty or overlapping alliances.
    /// Duplicate team keys within one side collapse into one.
    pub fn new<A, B>(side_a: A, side_b: B, score_a: f64, score_b: f64) -> Result<Self, OprError>
    where
        A: IntoIterator,
        A::Item: Into<TeamId>,
        B: IntoIterator,
        B::Item: Into<TeamId>,
    {
        let side_a: BTreeSet<TeamId> = side_a.into_iter().map(Into::into).collect();
        let side_b: BTreeSet<TeamId> = side_b.into_iter().map(Into::into).collect();

        if side_a.is_empty() || side_b.is_empty() {
            return Err(OprError::InvalidGame {
                reason: "each alliance needs at least one team".to_string(),
            });
        }
        if let Some(team) = side_a.intersection(&side_b).next() {
            return Err(OprError::InvalidGame {
                reason: format!("team {} appears on both alliances", team),
            });
        }

        Ok(GameRecord {
            side_a,
            side_b,
            scores: Scores {
                a: score_a,
                b: score_b,
            },
        })
    }

    pub fn side_a(&self) -> &BTreeSet<TeamId> {
        &self.side_a
    }

    pub fn side_b(&self) -> &BTreeSet<TeamId> {
        &self.side_b
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Both alliances in row order, each with its score.
    pub fn alliances(&self) -> [(&BTreeSet<TeamId>, f64); 2] {
        let scores = self.scores();
        [(self.side_a(), scores.a), (self.side_b(), scores.b)]
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamId> {
        self.side_a().iter().chain(self.side_b())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game() {
        let g = GameRecord::new(["1", "2"], ["3", "4"], 100.0, 80.0).unwrap();
        assert_eq!(g.side_a().len(), 2);
        assert_eq!(g.side_b().len(), 2);
        assert_eq!(g.scores(), Scores { a: 100.0, b: 80.0 });
        assert_eq!(g.teams().count(), 4);
    }

    #[test]
    fn test_empty_side_rejected() {
        let empty: [&str; 0] = [];
        let err = GameRecord::new(empty, ["3"], 10.0, 20.0).unwrap_err();
        assert!(matches!(err, OprError::InvalidGame { .. }));
    }

    #[test]
    fn test_overlapping_sides_rejected() {
        let err = GameRecord::new(["1", "2"], ["2", "3"], 10.0, 20.0).unwrap_err();
        assert!(matches!(err, OprError::InvalidGame { .. }));
    }

    #[test]
    fn test_duplicate_team_collapses() {
        let g = GameRecord::new(["1", "1"], ["2"], 10.0, 20.0).unwrap();
        assert_eq!(g.side_a().len(), 1);
    }

    #[test]
    fn test_negative_scores_allowed() {
        let g = GameRecord::new(["1"], ["2"], -5.0, 3.0).unwrap();
        assert_eq!(g.scores().a, -5.0);
    }
}
