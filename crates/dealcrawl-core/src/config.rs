use crate::app_config::{AppConfig, DelayRange, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds a value that cannot be parsed or
/// the resulting configuration is inconsistent.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds a value that cannot be parsed or
/// the resulting configuration is inconsistent.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; absent ones fall back to the defaults listed
/// in [`AppConfig::default`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;
    use std::str::FromStr;

    use rust_decimal::Decimal;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_decimal = |var: &str, default: &str| -> Result<Decimal, ConfigError> {
        let raw = or_default(var, default);
        Decimal::from_str(raw.trim()).map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_secs = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(invalid(var, format!("{raw} is not a non-negative number of seconds")));
        }
        Ok(secs)
    };

    let parse_range = |prefix: &str, min: &str, max: &str| -> Result<DelayRange, ConfigError> {
        let min_var = format!("{prefix}_MIN");
        let max_var = format!("{prefix}_MAX");
        let range = DelayRange::new(parse_secs(&min_var, min)?, parse_secs(&max_var, max)?);
        if range.min_secs > range.max_secs {
            return Err(ConfigError::Validation(format!(
                "{min_var} ({}) must not exceed {max_var} ({})",
                range.min_secs, range.max_secs
            )));
        }
        Ok(range)
    };

    let min_price = parse_decimal("DEALCRAWL_MIN_PRICE", "1.0")?;
    let max_price = parse_decimal("DEALCRAWL_MAX_PRICE", "1000.0")?;
    if min_price >= max_price {
        return Err(ConfigError::Validation(format!(
            "DEALCRAWL_MIN_PRICE ({min_price}) must be below DEALCRAWL_MAX_PRICE ({max_price})"
        )));
    }

    let default_shipping_cost = parse_decimal("DEALCRAWL_DEFAULT_SHIPPING", "3.99")?;
    if default_shipping_cost.is_sign_negative() {
        return Err(invalid(
            "DEALCRAWL_DEFAULT_SHIPPING",
            format!("{default_shipping_cost} is negative"),
        ));
    }

    let request_timeout_secs = parse_u64("DEALCRAWL_REQUEST_TIMEOUT", "15")?;
    let max_retries = parse_u32("DEALCRAWL_MAX_RETRIES", "2")?;
    let cache_duration_secs = parse_u64("DEALCRAWL_CACHE_DURATION", "3600")?;

    let cache_file = PathBuf::from(or_default("DEALCRAWL_CACHE_FILE", ".http_cache.json"));
    let products_file = PathBuf::from(or_default("DEALCRAWL_PRODUCTS_FILE", "products.yml"));
    let shipping_file = PathBuf::from(or_default("DEALCRAWL_SHIPPING_FILE", "shipping.yaml"));

    let default_delay = parse_range("DEALCRAWL_DEFAULT_DELAY", "1.0", "2.0")?;
    let notino_delay = parse_range("DEALCRAWL_NOTINO_DELAY", "4.0", "7.0")?;
    let retry_delay = parse_range("DEALCRAWL_RETRY_DELAY", "5.0", "8.0")?;

    let user_agent = or_default("DEALCRAWL_USER_AGENT", DEFAULT_USER_AGENT);
    let log_level = or_default("DEALCRAWL_LOG_LEVEL", "warn");

    Ok(AppConfig {
        min_price,
        max_price,
        request_timeout_secs,
        max_retries,
        cache_duration_secs,
        cache_file,
        products_file,
        shipping_file,
        default_shipping_cost,
        default_delay,
        notino_delay,
        retry_delay,
        user_agent,
        log_level,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
