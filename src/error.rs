//! Error types for rating estimation and match normalization.

/// Errors raised by the OPR core.
///
/// Transport and configuration failures stay in `anyhow`; this enum only
/// covers the cases callers are expected to match on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OprError {
    #[error("no games to rate: the game list is empty")]
    EmptyInput,

    #[error("match is missing expected field `{field}`")]
    SchemaMismatch { field: String },

    #[error("invalid game record: {reason}")]
    InvalidGame { reason: String },

    #[error("unknown game type `{value}` (expected FRC or FTC)")]
    UnknownGameType { value: String },
}
