use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// An inclusive `[min, max]` band over a percent or ratio value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both boundaries are inclusive. NaN never belongs to a band.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Price adjustment mode requested from the history provider.
/// The wire form is the provider's `fqt`-style token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
pub enum AdjustMode {
    /// Forward-adjusted ("qfq"), the mode every screening pass uses.
    #[default]
    #[strum(to_string = "qfq")]
    Forward,
    /// Backward-adjusted ("hfq").
    #[strum(to_string = "hfq")]
    Backward,
    /// Unadjusted raw prices.
    #[strum(to_string = "none")]
    Raw,
}

impl AdjustMode {
    pub(crate) fn wire_code(self) -> &'static str {
        match self {
            AdjustMode::Forward => "1",
            AdjustMode::Backward => "2",
            AdjustMode::Raw => "0",
        }
    }
}
