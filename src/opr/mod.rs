pub mod estimator;
pub mod game;
pub mod weighting;

pub use estimator::{compute_opr, RatingMap};
pub use game::{GameRecord, TeamId};
pub use weighting::WeightingPolicy;
