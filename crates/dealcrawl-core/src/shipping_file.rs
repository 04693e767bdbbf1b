//! Loader for the per-store shipping file.
//!
//! The file is a YAML list of records:
//!
//! ```yaml
//! - site: notino.pt
//!   shipping: 3.99
//!   free-over: 35
//! ```

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_yaml::Value;

use crate::ConfigError;

/// One valid record from the shipping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingEntry {
    pub site: String,
    /// Flat fee charged below the threshold.
    pub shipping: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_over: Decimal,
}

/// Reads and validates the shipping file.
///
/// Malformed records are skipped with a warning; the rest of the file still
/// loads.
///
/// # Errors
///
/// Returns `ConfigError::ShippingFileIo` when the file cannot be read,
/// `ConfigError::ShippingFileParse` on invalid YAML, and
/// `ConfigError::Validation` when the file is empty, its root is not a list,
/// or no record is valid.
pub fn load_shipping_entries(path: &Path) -> Result<Vec<ShippingEntry>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ShippingFileIo {
        path: display.clone(),
        source,
    })?;
    parse_shipping_entries(&raw, &display)
}

pub(crate) fn parse_shipping_entries(
    raw: &str,
    origin: &str,
) -> Result<Vec<ShippingEntry>, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Validation(format!("shipping file {origin} is empty")));
    }

    let root: Value =
        serde_yaml::from_str(raw).map_err(|source| ConfigError::ShippingFileParse {
            path: origin.to_string(),
            source,
        })?;

    let records = match root {
        Value::Sequence(records) => records,
        Value::Null => {
            return Err(ConfigError::Validation(format!("shipping file {origin} is empty")));
        }
        _ => {
            return Err(ConfigError::Validation(format!(
                "shipping file {origin} must contain a list of entries"
            )));
        }
    };

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                tracing::warn!(file = %origin, index, reason = %reason, "skipping shipping entry");
            }
        }
    }

    if entries.is_empty() {
        return Err(ConfigError::Validation(format!(
            "shipping file {origin} has no valid entries"
        )));
    }

    Ok(entries)
}

fn parse_record(record: &Value) -> Result<ShippingEntry, String> {
    let Value::Mapping(fields) = record else {
        return Err("entry is not a mapping".to_string());
    };

    let site = match fields.get("site") {
        Some(Value::String(site)) if !site.trim().is_empty() => site.trim().to_string(),
        Some(_) => return Err("site must be a non-empty string".to_string()),
        None => return Err("missing site".to_string()),
    };

    let shipping = amount_field(fields.get("shipping"), "shipping", &site)?;
    let free_over = amount_field(fields.get("free-over"), "free-over", &site)?;

    Ok(ShippingEntry {
        site,
        shipping,
        free_over,
    })
}

fn amount_field(value: Option<&Value>, field: &str, site: &str) -> Result<Decimal, String> {
    let raw = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(format!("{field} for {site} is not a number")),
        None => return Err(format!("missing {field} for {site}")),
    };

    let amount =
        Decimal::from_str(&raw).map_err(|_| format!("{field} for {site} is not a number: {raw}"))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(format!("{field} for {site} is negative: {amount}"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let raw = "\
- site: notino.pt
  shipping: 3.99
  free-over: 35
- site: www.wells.pt
  shipping: \"2.50\"
  free-over: \"49.90\"
";
        let entries = parse_shipping_entries(raw, "shipping.yaml").unwrap();
        assert_eq!(
            entries,
            vec![
                ShippingEntry {
                    site: "notino.pt".to_string(),
                    shipping: Decimal::new(399, 2),
                    free_over: Decimal::new(35, 0),
                },
                ShippingEntry {
                    site: "www.wells.pt".to_string(),
                    shipping: Decimal::new(250, 2),
                    free_over: Decimal::new(4990, 2),
                },
            ]
        );
    }

    #[test]
    fn skips_incomplete_and_invalid_records() {
        let raw = "\
- site: a.pt
  shipping: 3
- site: b.pt
  shipping: cheap
  free-over: 40
- site: c.pt
  shipping: -1
  free-over: 40
- just a string
- site: d.pt
  shipping: 0
  free-over: 20
";
        let entries = parse_shipping_entries(raw, "shipping.yaml").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].site, "d.pt");
        assert_eq!(entries[0].shipping, Decimal::ZERO);
    }

    #[test]
    fn empty_file_is_fatal() {
        let result = parse_shipping_entries("\n", "shipping.yaml");
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected Validation, got: {result:?}"
        );
    }

    #[test]
    fn mapping_root_is_fatal() {
        let result = parse_shipping_entries("notino.pt: 3.99\n", "shipping.yaml");
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("list")),
            "expected Validation, got: {result:?}"
        );
    }

    #[test]
    fn zero_valid_records_is_fatal() {
        let raw = "- site: a.pt\n- site: b.pt\n  shipping: x\n  free-over: 1\n";
        let result = parse_shipping_entries(raw, "shipping.yaml");
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("no valid")),
            "expected Validation, got: {result:?}"
        );
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let result = parse_shipping_entries("- site: [oops\n", "shipping.yaml");
        assert!(
            matches!(result, Err(ConfigError::ShippingFileParse { .. })),
            "expected ShippingFileParse, got: {result:?}"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_shipping_entries(&dir.path().join("shipping.yaml"));
        assert!(
            matches!(result, Err(ConfigError::ShippingFileIo { .. })),
            "expected ShippingFileIo, got: {result:?}"
        );
    }

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipping.yaml");
        std::fs::write(&path, "- site: notino.pt\n  shipping: 3.99\n  free-over: 35\n").unwrap();
        let entries = load_shipping_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
