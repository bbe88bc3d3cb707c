//! Registrar pricing and timing policy
//!
//! Loaded from TOML with `RNS_*` environment overrides. All conversions
//! between token amounts and durations use integer math with a u128
//! intermediate; no floating point.

use crate::errors::{RegistrarError, Result};
use rns_types::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Smallest-unit amount equal to one whole token.
pub const TOKEN_UNIT: Amount = 100_000_000;

/// One day in seconds.
pub const DAY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Length of one registration term
    pub base_term_secs: u64,
    /// How long after expiry the owner may still renew
    pub grace_period_secs: u64,
    /// An active name whose expiry is this close is reported as rent-due
    pub rent_due_window_secs: u64,
    /// Reveal window of a sealed bid; afterwards the bid can only be cancelled
    pub bid_expiry_secs: u64,
    /// Minimum value accepted by `register` and `finalize_bid`
    pub registration_price: Amount,
    /// Amount buying one full term through `renew`
    pub renewal_price_per_term: Amount,
    /// Amount buying one full term through `pay_rent`
    pub rent_price_per_term: Amount,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            base_term_secs: 365 * DAY_SECS,
            grace_period_secs: 90 * DAY_SECS,
            rent_due_window_secs: 30 * DAY_SECS,
            bid_expiry_secs: 7 * DAY_SECS,
            registration_price: TOKEN_UNIT,
            renewal_price_per_term: TOKEN_UNIT,
            rent_price_per_term: TOKEN_UNIT,
        }
    }
}

impl RegistrarConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RegistrarConfig = toml::from_str(content)
            .map_err(|e| RegistrarError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(target: "registrar", "Loading registrar configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistrarError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `RNS_*` environment variables on top of the current values.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let fields: [(&str, &mut u64); 7] = [
            ("RNS_BASE_TERM_SECS", &mut self.base_term_secs),
            ("RNS_GRACE_PERIOD_SECS", &mut self.grace_period_secs),
            ("RNS_RENT_DUE_WINDOW_SECS", &mut self.rent_due_window_secs),
            ("RNS_BID_EXPIRY_SECS", &mut self.bid_expiry_secs),
            ("RNS_REGISTRATION_PRICE", &mut self.registration_price),
            ("RNS_RENEWAL_PRICE_PER_TERM", &mut self.renewal_price_per_term),
            ("RNS_RENT_PRICE_PER_TERM", &mut self.rent_price_per_term),
        ];

        for (key, slot) in fields {
            let Ok(raw) = std::env::var(key) else {
                continue;
            };
            match raw.trim().parse::<u64>() {
                Ok(value) => *slot = value,
                Err(error) => {
                    warn!(target: "registrar", key, value = %raw, %error, "ignoring invalid override")
                }
            }
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_term_secs == 0 {
            return Err(RegistrarError::Config("base_term_secs must be positive".into()));
        }
        if self.renewal_price_per_term == 0 {
            return Err(RegistrarError::Config(
                "renewal_price_per_term must be positive".into(),
            ));
        }
        if self.rent_price_per_term == 0 {
            return Err(RegistrarError::Config(
                "rent_price_per_term must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Seconds bought by `amount` at `price_per_term` per base term.
    pub fn duration_for(&self, amount: Amount, price_per_term: Amount) -> Result<u64> {
        if price_per_term == 0 {
            return Err(RegistrarError::Config("price per term is zero".into()));
        }
        let secs = amount as u128 * self.base_term_secs as u128 / price_per_term as u128;
        u64::try_from(secs).map_err(|_| RegistrarError::Overflow("purchased duration"))
    }

    /// Smallest amount that buys at least one second at `price_per_term`.
    pub fn min_payment(&self, price_per_term: Amount) -> Amount {
        price_per_term.div_ceil(self.base_term_secs).max(1)
    }
}
