use capsule_types::{Asset, PriceOracle};
use tracing::{debug, warn};

use crate::{config::PlannerConfig, errors::ValuationError, utils::format::format_usd};

pub const PLACEHOLDER: &str = "----";

/// Last USD valuation of a capsule's assets.
///
/// Oracle failures never propagate: they land in [`ValuationSnapshot::last_error`] and the
/// display falls back to the placeholder.
#[derive(Clone, Debug)]
pub struct ValuationSnapshot {
    usd: Option<f64>,
    last_error: Option<ValuationError>,
    placeholder: String,
}

impl Default for ValuationSnapshot {
    fn default() -> Self {
        Self::with_placeholder(PLACEHOLDER)
    }
}

impl ValuationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::with_placeholder(config.valuation_placeholder.clone())
    }

    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        Self {
            usd: None,
            last_error: None,
            placeholder: placeholder.into(),
        }
    }

    pub async fn refresh<O>(&mut self, oracle: &O, assets: &[Asset])
    where
        O: PriceOracle + ?Sized,
    {
        let result = match oracle.usd_valuation(assets).await {
            Ok(usd) if usd.is_finite() && usd >= 0.0 => Ok(usd),
            Ok(usd) => Err(ValuationError::InvalidValue(usd)),
            Err(err) => Err(ValuationError::Oracle(err)),
        };

        match result {
            Ok(usd) => {
                debug!(usd, assets = assets.len(), "valuation refreshed");
                self.usd = Some(usd);
                self.last_error = None;
            }
            Err(err) => {
                warn!(%err, "valuation unavailable");
                self.usd = None;
                self.last_error = Some(err);
            }
        }
    }

    pub fn usd(&self) -> Option<f64> {
        self.usd
    }

    pub fn last_error(&self) -> Option<&ValuationError> {
        self.last_error.as_ref()
    }

    /// Rounded, thousands-grouped dollars, or the placeholder.
    pub fn display(&self) -> String {
        match self.usd {
            Some(usd) => format_usd(usd),
            None => self.placeholder.clone(),
        }
    }
}
