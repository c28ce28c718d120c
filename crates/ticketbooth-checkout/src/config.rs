//! # Checkout Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TICKETBOOTH_CURRENCY=EUR                                           │
//! │     TICKETBOOTH_TAX_RATE=800            (basis points)                 │
//! │     TICKETBOOTH_PAYMENT_DELAY_MS=2000                                  │
//! │     TICKETBOOTH_PLATFORM_FEE_MODE=true                                 │
//! │     TICKETBOOTH_FEE_CACHE_TTL_SECS=300                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/checkout/checkout.toml (Linux)                           │
//! │     ~/Library/Application Support/com.ticketbooth.checkout/ (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, 8% tax, 2s mock delay, card fees passed to the buyer          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! currency = "USD"
//! tax_rate_bps = 800
//! platform_fee_mode = false
//!
//! [gateway]
//! payment_delay_ms = 2000
//! base_url = "https://checkout.ticketbooth.test"
//!
//! [fee_cache]
//! ttl_secs = 300
//! capacity = 256
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ticketbooth_core::pricing::PricingCalculator;
use ticketbooth_core::validation::{validate_http_url, validate_tax_rate_bps};
use ticketbooth_core::{TaxRate, DEFAULT_TAX_RATE};

use crate::error::ConfigError;
use crate::fees::FeeCache;
use crate::gateway::MockPaymentGateway;

// =============================================================================
// Sections
// =============================================================================

/// How checkouts are priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// ISO 4217 currency code sent with every payment.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Flat tax rate in basis points (800 = 8%).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Operator absorbs card fees instead of passing them to the buyer.
    /// Only used for checkouts whose form doesn't carry its own flag.
    #[serde(default)]
    pub platform_fee_mode: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE.bps()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            currency: default_currency(),
            tax_rate_bps: default_tax_rate_bps(),
            platform_fee_mode: false,
        }
    }
}

/// Payment gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Simulated latency of the mock gateway (milliseconds).
    #[serde(default = "default_payment_delay_ms")]
    pub payment_delay_ms: u64,

    /// Host of generated checkout URLs.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_payment_delay_ms() -> u64 {
    2000
}

fn default_base_url() -> String {
    "https://checkout.ticketbooth.test".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            payment_delay_ms: default_payment_delay_ms(),
            base_url: default_base_url(),
        }
    }
}

/// Fee quote cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    256
}

impl Default for FeeCacheSettings {
    fn default() -> Self {
        FeeCacheSettings {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
        }
    }
}

// =============================================================================
// Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub fee_cache: FeeCacheSettings,
}

impl CheckoutConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let currency = &self.pricing.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "currency must be a three-letter ISO code, got: {}",
                currency
            )));
        }

        validate_tax_rate_bps(self.pricing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        validate_http_url("gateway.base_url", &self.gateway.base_url)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.fee_cache.capacity == 0 {
            return Err(ConfigError::Invalid(
                "fee_cache.capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and skipped.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(currency) = lookup("TICKETBOOTH_CURRENCY") {
            debug!(currency = %currency, "Overriding currency from environment");
            self.pricing.currency = currency.trim().to_uppercase();
        }

        if let Some(rate) = lookup("TICKETBOOTH_TAX_RATE") {
            match rate.trim().parse::<u32>() {
                Ok(bps) => {
                    debug!(
                        percent = TaxRate::from_bps(bps).percentage(),
                        "Overriding tax rate from environment"
                    );
                    self.pricing.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %rate, "Ignoring invalid TICKETBOOTH_TAX_RATE"),
            }
        }

        if let Some(delay) = lookup("TICKETBOOTH_PAYMENT_DELAY_MS") {
            match delay.trim().parse::<u64>() {
                Ok(ms) => self.gateway.payment_delay_ms = ms,
                Err(_) => warn!(value = %delay, "Ignoring invalid TICKETBOOTH_PAYMENT_DELAY_MS"),
            }
        }

        if let Some(mode) = lookup("TICKETBOOTH_PLATFORM_FEE_MODE") {
            match mode.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.pricing.platform_fee_mode = true,
                "0" | "false" | "no" | "off" => self.pricing.platform_fee_mode = false,
                _ => warn!(value = %mode, "Ignoring invalid TICKETBOOTH_PLATFORM_FEE_MODE"),
            }
        }

        if let Some(ttl) = lookup("TICKETBOOTH_FEE_CACHE_TTL_SECS") {
            match ttl.trim().parse::<u64>() {
                Ok(secs) => self.fee_cache.ttl_secs = secs,
                Err(_) => warn!(value = %ttl, "Ignoring invalid TICKETBOOTH_FEE_CACHE_TTL_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ticketbooth", "checkout")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.tax_rate_bps)
    }

    pub fn pricing_calculator(&self) -> PricingCalculator {
        PricingCalculator::with_tax_rate(self.tax_rate())
    }

    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.gateway.payment_delay_ms)
    }

    pub fn fee_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fee_cache.ttl_secs)
    }

    pub fn build_fee_cache(&self) -> FeeCache {
        FeeCache::new(self.fee_cache.capacity, self.fee_cache_ttl())
    }

    pub fn build_mock_gateway(&self) -> MockPaymentGateway {
        MockPaymentGateway::with_delay(self.payment_delay()).with_base_url(&self.gateway.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing.currency, "USD");
        assert_eq!(config.tax_rate().bps(), 800);
        assert_eq!(config.payment_delay(), Duration::from_secs(2));
        assert!(!config.pricing.platform_fee_mode);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CheckoutConfig::from_toml(
            r#"
            [pricing]
            currency = "EUR"

            [fee_cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.currency, "EUR");
        assert_eq!(config.pricing.tax_rate_bps, 800);
        assert_eq!(config.fee_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.fee_cache.capacity, 256);
        assert_eq!(config.gateway.payment_delay_ms, 2000);
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = CheckoutConfig::from_toml("[pricing]\ntax_rate_bps = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TICKETBOOTH_CURRENCY", "gbp"),
            ("TICKETBOOTH_TAX_RATE", "2000"),
            ("TICKETBOOTH_PAYMENT_DELAY_MS", "50"),
            ("TICKETBOOTH_PLATFORM_FEE_MODE", "true"),
            ("TICKETBOOTH_FEE_CACHE_TTL_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = CheckoutConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.pricing.currency, "GBP");
        assert_eq!(config.tax_rate().bps(), 2000);
        assert_eq!(config.payment_delay(), Duration::from_millis(50));
        assert!(config.pricing.platform_fee_mode);
        assert_eq!(config.fee_cache.ttl_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CheckoutConfig::default();

        config.pricing.currency = "usd".to_string();
        assert!(config.validate().is_err());
        config.pricing.currency = "USD".to_string();

        config.pricing.tax_rate_bps = 10_001;
        assert!(config.validate().is_err());
        config.pricing.tax_rate_bps = 800;

        config.gateway.base_url = "ftp://pay.example.com".to_string();
        assert!(config.validate().is_err());
        config.gateway.base_url = default_base_url();

        config.fee_cache.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let config = CheckoutConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[pricing]"));
        assert!(toml_str.contains("[fee_cache]"));
        assert_eq!(CheckoutConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_builders() {
        let config = CheckoutConfig::default();
        let cache = config.build_fee_cache();
        assert_eq!(cache.capacity(), 256);
        assert_eq!(cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.pricing_calculator().tax_rate(), DEFAULT_TAX_RATE);
        assert_eq!(config.build_mock_gateway().call_count(), 0);
    }
}
