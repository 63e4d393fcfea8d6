//! Offensive Power Rating via least squares.
//!
//! Each alliance appearance is one equation: the sum of its members' ratings
//! should equal the alliance score. With `M` games and `N` distinct teams the
//! system has `2M` rows and `N` columns:
//!
//! ```text
//!   A x ≈ s      A[2i][j]   = sqrt(w_i) if team j played on side A of game i
//!                s[2i]      = sqrt(w_i) * score_a(i)
//!                A[2i+1][j] = sqrt(w_i) if team j played on side B of game i
//!                s[2i+1]    = sqrt(w_i) * score_b(i)
//! ```
//!
//! The system is solved through an SVD pseudo-inverse, so rank-deficient
//! schedules (two teams that always play together) yield the minimum-norm
//! solution instead of an error.

use nalgebra::{DMatrix, DVector};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::game::{GameRecord, TeamId};
use super::weighting::WeightingPolicy;
use crate::error::OprError;

/// Singular values below `RCOND * sigma_max` are treated as zero.
const RCOND: f64 = 1e-10;

/// Team -> rating, ordered by team id.
pub type RatingMap = BTreeMap<TeamId, f64>;

/// Assign each team a column. Teams are sorted so the layout is reproducible.
fn team_columns(games: &[GameRecord]) -> BTreeMap<&TeamId, usize> {
    let teams: BTreeSet<&TeamId> = games.iter().flat_map(|g| g.teams()).collect();
    teams.into_iter().enumerate().map(|(i, t)| (t, i)).collect()
}

/// Build the (scaled) design matrix and target vector.
fn build_system(
    games: &[GameRecord],
    columns: &BTreeMap<&TeamId, usize>,
    policy: &WeightingPolicy,
) -> (DMatrix<f64>, DVector<f64>) {
    let weights = policy.weights(games.len());
    let mut a = DMatrix::zeros(games.len() * 2, columns.len());
    let mut s = DVector::zeros(games.len() * 2);

    for (i, (game, w)) in games.iter().zip(weights).enumerate() {
        let scale = w.sqrt();
        for (side, (teams, score)) in game.alliances().into_iter().enumerate() {
            let row = 2 * i + side;
            for team in teams {
                a[(row, columns[team])] = scale;
            }
            s[row] = score * scale;
        }
    }

    (a, s)
}

/// Compute every team's OPR from a list of games.
///
/// Returns one entry per team that appears in `games`. Fails only when
/// `games` is empty.
pub fn compute_opr(games: &[GameRecord], policy: &WeightingPolicy) -> Result<RatingMap, OprError> {
    if games.is_empty() {
        return Err(OprError::EmptyInput);
    }

    let columns = team_columns(games);
    let (a, s) = build_system(games, &columns, policy);
    let (rows, cols) = a.shape();
    debug!(rows, cols, weighted = policy.is_weighted(), "Solving OPR system");

    let x = solve_min_norm(a, &s);

    Ok(columns
        .into_iter()
        .map(|(team, col)| (team.clone(), x[col]))
        .collect())
}

/// Minimum-norm least-squares solution of `a x = s`.
fn solve_min_norm(a: DMatrix<f64>, s: &DVector<f64>) -> DVector<f64> {
    let cols = a.ncols();
    let svd = a.svd(true, true);
    let eps = svd.singular_values.max() * RCOND;

    let rank = svd.rank(eps);
    if rank < cols {
        warn!(
            rank,
            teams = cols,
            "OPR system is rank deficient; returning minimum-norm ratings"
        );
    }

    // U and V^T are always requested above, so solve cannot fail here.
    match svd.solve(s, eps) {
        Ok(x) => x,
        Err(e) => {
            warn!("SVD solve failed ({}), returning zero ratings", e);
            DVector::zeros(cols)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn game(a: &[&str], b: &[&str], sa: f64, sb: f64) -> GameRecord {
        GameRecord::new(a.iter().copied(), b.iter().copied(), sa, sb).unwrap()
    }

    fn rating(map: &RatingMap, team: &str) -> f64 {
        map[&TeamId::new(team)]
    }

    fn round_robin(last_blue_score: f64) -> Vec<GameRecord> {
        vec![
            game(&["1", "2"], &["3", "4"], 100.0, 80.0),
            game(&["1", "3"], &["2", "4"], 90.0, 95.0),
            game(&["1", "4"], &["2", "3"], 85.0, 92.0),
            game(&["1", "2"], &["3", "4"], last_blue_score, 80.0),
        ]
    }

    #[test]
    fn test_empty_input() {
        let err = compute_opr(&[], &WeightingPolicy::Uniform).unwrap_err();
        assert_eq!(err, OprError::EmptyInput);
        let err = compute_opr(&[], &WeightingPolicy::recency()).unwrap_err();
        assert_eq!(err, OprError::EmptyInput);
    }

    #[test]
    fn test_single_game_exact() {
        let games = vec![game(&["A"], &["B"], 42.0, 17.5)];
        let opr = compute_opr(&games, &WeightingPolicy::Uniform).unwrap();
        assert_eq!(opr.len(), 2);
        assert_relative_eq!(rating(&opr, "A"), 42.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "B"), 17.5, epsilon = 1e-9);
    }

    #[test]
    fn test_single_game_weighted_same_as_unweighted() {
        // One game gets weight 1.0 under the linear policy.
        let games = vec![game(&["A"], &["B"], 42.0, 17.5)];
        let opr = compute_opr(&games, &WeightingPolicy::recency()).unwrap();
        assert_relative_eq!(rating(&opr, "A"), 42.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "B"), 17.5, epsilon = 1e-9);
    }

    #[test]
    fn test_keys_are_exactly_the_teams_played() {
        let games = vec![
            game(&["10", "20", "30"], &["40", "50", "60"], 50.0, 60.0),
            game(&["10", "40", "70"], &["20", "50", "80"], 70.0, 40.0),
        ];
        let opr = compute_opr(&games, &WeightingPolicy::Uniform).unwrap();
        let keys: Vec<&str> = opr.keys().map(TeamId::as_str).collect();
        assert_eq!(keys, vec!["10", "20", "30", "40", "50", "60", "70", "80"]);
    }

    #[test]
    fn test_two_game_scenario_least_squares() {
        // Both games constrain the four-team total (180 vs 185), so the system
        // has rank 3 and the fit splits the difference.
        let games = vec![
            game(&["1", "2"], &["3", "4"], 100.0, 80.0),
            game(&["1", "3"], &["2", "4"], 90.0, 95.0),
        ];
        let opr = compute_opr(&games, &WeightingPolicy::Uniform).unwrap();
        assert_eq!(opr.len(), 4);

        assert_relative_eq!(rating(&opr, "1") + rating(&opr, "2"), 101.25, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "3") + rating(&opr, "4"), 81.25, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "1") + rating(&opr, "3"), 88.75, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "2") + rating(&opr, "4"), 93.75, epsilon = 1e-9);

        // Minimum-norm pick along the null space direction (1, -1, -1, 1).
        assert_relative_eq!(rating(&opr, "1"), 49.375, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "2"), 51.875, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "3"), 39.375, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "4"), 41.875, epsilon = 1e-9);
    }

    #[test]
    fn test_consistent_schedule_reproduces_scores() {
        // Ratings 10, 20, 30, 40 generate every score exactly.
        let games = vec![
            game(&["1", "2"], &["3", "4"], 30.0, 70.0),
            game(&["1", "3"], &["2", "4"], 40.0, 60.0),
            game(&["1", "4"], &["2", "3"], 50.0, 50.0),
        ];
        let opr = compute_opr(&games, &WeightingPolicy::Uniform).unwrap();
        assert_relative_eq!(rating(&opr, "1"), 10.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "2"), 20.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "3"), 30.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "4"), 40.0, epsilon = 1e-9);

        // Weighting cannot move an exact fit.
        let weighted = compute_opr(&games, &WeightingPolicy::recency()).unwrap();
        for (team, r) in &opr {
            assert_relative_eq!(weighted[team], *r, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inseparable_partners_get_min_norm_split() {
        // "1" and "2" always play together, so only their sum is identified.
        let games = vec![
            game(&["1", "2"], &["3"], 60.0, 20.0),
            game(&["1", "2"], &["4"], 60.0, 30.0),
        ];
        let opr = compute_opr(&games, &WeightingPolicy::Uniform).unwrap();
        assert_relative_eq!(rating(&opr, "1"), 30.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "2"), 30.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "3"), 20.0, epsilon = 1e-9);
        assert_relative_eq!(rating(&opr, "4"), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let games = round_robin(110.0);
        let first = compute_opr(&games, &WeightingPolicy::recency()).unwrap();
        let second = compute_opr(&games, &WeightingPolicy::recency()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recent_games_weigh_more() {
        // Games 0 and 3 are identical; only the later copy gets perturbed by +30.
        let shift = |policy: WeightingPolicy| {
            let base = compute_opr(&round_robin(100.0), &policy).unwrap();
            let moved = compute_opr(&round_robin(130.0), &policy).unwrap();
            (rating(&moved, "1") + rating(&moved, "2")) - (rating(&base, "1") + rating(&base, "2"))
        };

        let unweighted = shift(WeightingPolicy::Uniform);
        let weighted = shift(WeightingPolicy::recency());

        assert_relative_eq!(unweighted, 11.25, epsilon = 1e-9);
        assert_relative_eq!(weighted, 16.875, epsilon = 1e-9);
        assert!(weighted > unweighted);
    }

    #[test]
    fn test_system_layout() {
        let games = vec![
            game(&["1", "2"], &["3"], 10.0, 20.0),
            game(&["2", "3"], &["1"], 30.0, 40.0),
        ];
        let columns = team_columns(&games);
        let policy = WeightingPolicy::Linear { min: 1.0, max: 4.0 };
        let (a, s) = build_system(&games, &columns, &policy);

        assert_eq!(a.shape(), (4, 3));
        assert_eq!(a.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0, 0.0]);
        assert_eq!(a.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 1.0]);
        assert_eq!(a.row(2).iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0, 2.0]);
        assert_eq!(a.row(3).iter().copied().collect::<Vec<_>>(), vec![2.0, 0.0, 0.0]);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![10.0, 20.0, 60.0, 80.0]);
    }
}
