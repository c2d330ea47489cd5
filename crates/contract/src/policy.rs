use serde::Deserialize;
use strum_macros::{Display, EnumString};

/// How population treats source keys that match no declared field.
///
/// Policies round-trip through their lowercase names, so they can be picked from
/// configuration text (`"strict"`, `"lenient"`, `"dynamic"`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Undeclared keys abort construction with an `INVALID_ATTR` validation error.
    Strict,
    /// Undeclared keys are dropped without a trace.
    #[default]
    Lenient,
    /// Undeclared keys are kept as raw, unvalidated extras on the instance.
    Dynamic,
}

impl Policy {
    /// `true` if undeclared keys fail construction.
    #[must_use]
    pub const fn rejects_undeclared(self) -> bool {
        matches!(self, Self::Strict)
    }

    /// `true` if undeclared keys are retained as extras.
    #[must_use]
    pub const fn keeps_extras(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}
