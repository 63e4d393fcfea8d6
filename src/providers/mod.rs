pub mod normalize;
pub mod provider;
pub mod schema;
pub mod tba;
pub mod toa;

pub use normalize::normalize_all;
pub use provider::MatchSource;
pub use schema::{Provider, ProviderSchema, ScorePolicy, TbaSeasonFields};
pub use tba::TheBlueAlliance;
pub use toa::TheOrangeAlliance;
