use clap::Parser;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::api::Credentials;
use crate::error::TraderError;
use crate::pricing::{AveragingMethod, Spread};
use crate::Result;

const DEFAULT_MARKET: &str = "BTC-LTC";
const DEFAULT_UNITS: &str = "1.0";
const DEFAULT_SPREAD: &str = "0.1/0.1";
const DEFAULT_METHOD: &str = "arithmetic";
const DEFAULT_DELAY_SECS: &str = "30";

pub const API_KEY_ENV: &str = "BITTREX_API_KEY";
pub const API_SECRET_ENV: &str = "BITTREX_API_SECRET";

/// Command-line options
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "autotrader", version, about = "Bittrex currency exchange autotrading")]
pub struct Cli {
    /// Configuration file (INI, [config] section); its values override flags
    #[arg(long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Bittrex issued API key
    #[arg(long)]
    pub apikey: Option<String>,

    /// Bittrex issued API secret
    #[arg(long)]
    pub secret: Option<String>,

    /// Market symbol (ie. BTC-LTC)
    #[arg(long)]
    pub market: Option<String>,

    /// BUY/SELL total units (default: 1.0)
    #[arg(long)]
    pub units: Option<String>,

    /// BUY/SELL markup/markdown percentage (default: 0.1/0.1)
    #[arg(long)]
    pub spread: Option<String>,

    /// Moving average calculation method (default: arithmetic)
    #[arg(long)]
    pub method: Option<String>,

    /// Seconds to delay order status requests (default: 30)
    #[arg(long)]
    pub delay: Option<String>,

    /// Require user interaction to begin trading (default: true)
    #[arg(long)]
    pub prompt: Option<String>,
}

/// Unvalidated settings as they appear in flags or the config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSettings {
    pub apikey: Option<String>,
    pub secret: Option<String>,
    pub market: Option<String>,
    pub units: Option<String>,
    pub spread: Option<String>,
    pub method: Option<String>,
    pub delay: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: RawSettings,
}

impl RawSettings {
    /// Parse the `[config]` section of an INI document
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Ini))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TraderError::Configuration(format!("invalid config file: {}", e)))?;
        Ok(file.config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TraderError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_ini_str(&contents)
    }

    /// Values set in `other` replace ours
    pub fn overridden_by(self, other: RawSettings) -> Self {
        Self {
            apikey: other.apikey.or(self.apikey),
            secret: other.secret.or(self.secret),
            market: other.market.or(self.market),
            units: other.units.or(self.units),
            spread: other.spread.or(self.spread),
            method: other.method.or(self.method),
            delay: other.delay.or(self.delay),
            prompt: other.prompt.or(self.prompt),
        }
    }
}

impl From<Cli> for RawSettings {
    fn from(cli: Cli) -> Self {
        Self {
            apikey: cli.apikey,
            secret: cli.secret,
            market: cli.market,
            units: cli.units,
            spread: cli.spread,
            method: cli.method,
            delay: cli.delay,
            prompt: cli.prompt,
        }
    }
}

/// Validated settings for one trading session, built once at startup
#[derive(Debug, Clone)]
pub struct TraderConfig {
    pub credentials: Credentials,
    pub market: String,
    pub units: Decimal,
    pub spread: Spread,
    pub method: AveragingMethod,
    pub delay: Duration,
    pub prompt: bool,
}

impl TraderConfig {
    /// Flags, then the config file, then environment variables for missing credentials
    pub fn load(cli: Cli) -> Result<Self> {
        let conf = cli.conf.clone();
        let mut raw = RawSettings::from(cli);
        if let Some(path) = conf {
            tracing::info!("Loading configuration from {}", path.display());
            raw = raw.overridden_by(RawSettings::from_file(&path)?);
        }

        Self::from_raw(raw, |name| std::env::var(name).ok())
    }

    pub fn from_raw(raw: RawSettings, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = required(raw.apikey.or_else(|| env(API_KEY_ENV)), "apikey", API_KEY_ENV)?;
        let secret = required(raw.secret.or_else(|| env(API_SECRET_ENV)), "secret", API_SECRET_ENV)?;

        let market = raw
            .market
            .unwrap_or_else(|| DEFAULT_MARKET.to_string())
            .trim()
            .to_uppercase();
        if market.is_empty() {
            return Err(TraderError::Configuration("market must not be empty".to_string()));
        }

        let units_raw = raw.units.unwrap_or_else(|| DEFAULT_UNITS.to_string());
        let units = Decimal::from_str(units_raw.trim())
            .map_err(|e| invalid("units", &units_raw, e))?;
        if units <= Decimal::ZERO {
            return Err(TraderError::Configuration(format!(
                "units must be positive, got {}",
                units_raw
            )));
        }

        let spread_raw = raw.spread.unwrap_or_else(|| DEFAULT_SPREAD.to_string());
        let spread = Spread::from_str(&spread_raw).map_err(TraderError::Configuration)?;

        let method_raw = raw.method.unwrap_or_else(|| DEFAULT_METHOD.to_string());
        let method = AveragingMethod::from_str(&method_raw).map_err(TraderError::Configuration)?;

        let delay_raw = raw.delay.unwrap_or_else(|| DEFAULT_DELAY_SECS.to_string());
        let delay = parse_delay(&delay_raw)?;

        let prompt = match raw.prompt {
            Some(value) => parse_bool(&value)?,
            None => true,
        };

        Ok(Self {
            credentials: Credentials::new(api_key, secret),
            market,
            units,
            spread,
            method,
            delay,
            prompt,
        })
    }
}

fn required(value: Option<String>, name: &str, env_name: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TraderError::Configuration(format!(
            "missing {} (pass --{}, set it in --conf, or export {})",
            name, name, env_name
        ))),
    }
}

fn invalid(name: &str, value: &str, err: impl std::fmt::Display) -> TraderError {
    TraderError::Configuration(format!("invalid {} '{}': {}", name, value, err))
}

fn parse_delay(value: &str) -> Result<Duration> {
    let secs: f64 = value.trim().parse().map_err(|e| invalid("delay", value, e))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(invalid("delay", value, "must be a non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid("delay", value, e))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid("prompt", value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn with_credentials() -> RawSettings {
        RawSettings {
            apikey: Some("key".to_string()),
            secret: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = TraderConfig::from_raw(with_credentials(), no_env).unwrap();

        assert_eq!(config.market, "BTC-LTC");
        assert_eq!(config.units, dec!(1.0));
        assert_eq!(config.spread, Spread::new(dec!(0.1), dec!(0.1)));
        assert_eq!(config.method, AveragingMethod::Arithmetic);
        assert_eq!(config.delay, Duration::from_secs(30));
        assert!(config.prompt);
    }

    #[test]
    fn test_missing_credentials() {
        let err = TraderConfig::from_raw(RawSettings::default(), no_env).unwrap_err();
        assert!(matches!(err, TraderError::Configuration(ref msg) if msg.contains("apikey")));

        let raw = RawSettings {
            apikey: Some("key".to_string()),
            secret: Some("  ".to_string()),
            ..Default::default()
        };
        let err = TraderConfig::from_raw(raw, no_env).unwrap_err();
        assert!(matches!(err, TraderError::Configuration(ref msg) if msg.contains("secret")));
    }

    #[test]
    fn test_credentials_from_env() {
        let env = |name: &str| match name {
            API_KEY_ENV => Some("env-key".to_string()),
            API_SECRET_ENV => Some("env-secret".to_string()),
            _ => None,
        };

        let config = TraderConfig::from_raw(RawSettings::default(), env).unwrap();
        assert_eq!(config.credentials, Credentials::new("env-key", "env-secret"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            RawSettings { units: Some("0".into()), ..with_credentials() },
            RawSettings { units: Some("lots".into()), ..with_credentials() },
            RawSettings { spread: Some("0.1".into()), ..with_credentials() },
            RawSettings { method: Some("weighted".into()), ..with_credentials() },
            RawSettings { delay: Some("-5".into()), ..with_credentials() },
            RawSettings { delay: Some("1e20".into()), ..with_credentials() },
            RawSettings { spread: Some("0.1/100".into()), ..with_credentials() },
            RawSettings { prompt: Some("maybe".into()), ..with_credentials() },
            RawSettings { market: Some(" ".into()), ..with_credentials() },
        ];

        for raw in cases {
            let result = TraderConfig::from_raw(raw.clone(), no_env);
            assert!(
                matches!(result, Err(TraderError::Configuration(_))),
                "expected configuration error for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_ini_file_overrides_flags() {
        let ini = "[config]\napikey = file-key\nsecret = file-secret\nmarket = btc-eth\nspread = 5/2\ndelay = 0.5\nprompt = False\n";
        let flags = RawSettings {
            market: Some("BTC-LTC".to_string()),
            units: Some("2.5".to_string()),
            ..Default::default()
        };

        let raw = flags.overridden_by(RawSettings::from_ini_str(ini).unwrap());
        let config = TraderConfig::from_raw(raw, no_env).unwrap();

        assert_eq!(config.credentials.api_key, "file-key");
        assert_eq!(config.market, "BTC-ETH");
        assert_eq!(config.units, dec!(2.5));
        assert_eq!(config.spread.markup, dec!(0.05));
        assert_eq!(config.spread.markdown, dec!(0.02));
        assert_eq!(config.delay, Duration::from_millis(500));
        assert!(!config.prompt);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "autotrader",
            "--apikey",
            "k",
            "--secret",
            "s",
            "--spread",
            "1/1",
            "--prompt",
            "false",
        ])
        .unwrap();
        assert!(cli.conf.is_none());

        let config = TraderConfig::from_raw(cli.into(), no_env).unwrap();
        assert_eq!(config.spread.markup, dec!(0.01));
        assert!(!config.prompt);
    }

    #[test]
    fn test_missing_config_file() {
        let err = RawSettings::from_file(Path::new("/nonexistent/autotrader.conf")).unwrap_err();
        assert!(matches!(err, TraderError::Configuration(_)));
    }
}
