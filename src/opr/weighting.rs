//! Per-game importance weights for the least-squares fit.
//!
//! Weights are applied to rows as `sqrt(w)`: an ordinary least-squares
//! solve of the scaled system equals a weighted fit of the unscaled one.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Every game counts the same.
    Uniform,
    /// Weight grows linearly with position in the game list, from `min` for
    /// the first game to `max` for the last.
    Linear { min: f64, max: f64 },
}

impl Default for WeightingPolicy {
    fn default() -> Self {
        WeightingPolicy::recency()
    }
}

impl WeightingPolicy {
    /// Recent games count up to 3x as much as the earliest one.
    pub fn recency() -> Self {
        WeightingPolicy::Linear { min: 1.0, max: 3.0 }
    }

    /// Weights for `n` games in list order.
    pub fn weights(&self, n: usize) -> Vec<f64> {
        match *self {
            WeightingPolicy::Uniform => vec![1.0; n],
            WeightingPolicy::Linear { min, max } => {
                match n {
                    0 => return Vec::new(),
                    1 => return vec![min],
                    _ => {}
                }
                let step = (max - min) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
                    .collect()
            }
        }
    }

    pub fn is_weighted(&self) -> bool {
        !matches!(self, WeightingPolicy::Uniform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_weights() {
        assert_eq!(WeightingPolicy::Uniform.weights(3), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_linear_endpoints() {
        let w = WeightingPolicy::recency().weights(5);
        assert_eq!(w.len(), 5);
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(w[4], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_single_game() {
        assert_eq!(WeightingPolicy::recency().weights(1), vec![1.0]);
    }

    #[test]
    fn test_linear_empty() {
        assert!(WeightingPolicy::recency().weights(0).is_empty());
    }

    #[test]
    fn test_weights_increase() {
        let w = WeightingPolicy::recency().weights(7);
        assert!(w.windows(2).all(|p| p[1] > p[0]));
    }
}
