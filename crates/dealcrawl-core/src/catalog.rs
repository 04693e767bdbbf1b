//! Product catalog: variant names mapped to the product pages that sell them.

use std::path::Path;

use serde_yaml::Value;

use crate::ConfigError;

/// One catalog line: a product variant and the store pages listing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    pub name: String,
    pub urls: Vec<String>,
}

impl ProductEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            urls,
        }
    }
}

/// Ordered product catalog as read from the products file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    pub entries: Vec<ProductEntry>,
}

impl ProductCatalog {
    #[must_use]
    pub fn new(entries: Vec<ProductEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductEntry> {
        self.entries.iter()
    }

    /// Total number of URLs across all entries.
    #[must_use]
    pub fn url_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.urls.len()).sum()
    }
}

impl<'a> IntoIterator for &'a ProductCatalog {
    type Item = &'a ProductEntry;
    type IntoIter = std::slice::Iter<'a, ProductEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Reads the products YAML file.
///
/// The file must hold a mapping of variant name to a list of URLs. Entry
/// order is preserved.
///
/// # Errors
///
/// Returns `ConfigError::CatalogFileIo` when the file cannot be read,
/// `ConfigError::CatalogFileParse` on invalid YAML, and
/// `ConfigError::Validation` when the file is empty or its root is not a mapping.
pub fn load_products(path: &Path) -> Result<ProductCatalog, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogFileIo {
        path: display.clone(),
        source,
    })?;
    parse_products(&raw, &display)
}

pub(crate) fn parse_products(raw: &str, origin: &str) -> Result<ProductCatalog, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Validation(format!("products file {origin} is empty")));
    }

    let root: Value = serde_yaml::from_str(raw).map_err(|source| ConfigError::CatalogFileParse {
        path: origin.to_string(),
        source,
    })?;

    let mapping = match root {
        Value::Mapping(mapping) => mapping,
        Value::Null => {
            return Err(ConfigError::Validation(format!("products file {origin} is empty")));
        }
        _ => {
            return Err(ConfigError::Validation(format!(
                "products file {origin} must contain a mapping at the root level"
            )));
        }
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Some(name) = scalar_to_string(&key) else {
            tracing::warn!(file = %origin, "skipping catalog entry with a non-scalar name");
            continue;
        };

        let urls = match value {
            Value::Sequence(items) => {
                let total = items.len();
                let urls: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(url) => Some(url),
                        _ => None,
                    })
                    .collect();
                if urls.len() != total {
                    tracing::warn!(
                        product = %name,
                        dropped = total - urls.len(),
                        "catalog entry contains non-string URLs"
                    );
                }
                urls
            }
            _ => {
                tracing::warn!(product = %name, "catalog entry does not have a list of URLs");
                Vec::new()
            }
        };

        entries.push(ProductEntry::new(name, urls));
    }

    Ok(ProductCatalog::new(entries))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Keeps only URLs whose host contains one of `sites` (case-insensitive).
/// Products left without URLs are dropped.
#[must_use]
pub fn filter_by_sites(catalog: &ProductCatalog, sites: &[String]) -> ProductCatalog {
    let sites: Vec<String> = sites.iter().map(|s| s.trim().to_lowercase()).collect();

    let entries = catalog
        .iter()
        .filter_map(|entry| {
            let urls: Vec<String> = entry
                .urls
                .iter()
                .filter(|url| {
                    let host = url_host(url);
                    sites.iter().any(|site| host.contains(site.as_str()))
                })
                .cloned()
                .collect();
            (!urls.is_empty()).then(|| ProductEntry::new(entry.name.clone(), urls))
        })
        .collect();

    ProductCatalog::new(entries)
}

/// Keeps products whose name contains one of `substrings` (case-insensitive).
#[must_use]
pub fn filter_by_products(catalog: &ProductCatalog, substrings: &[String]) -> ProductCatalog {
    let needles: Vec<String> = substrings.iter().map(|s| s.trim().to_lowercase()).collect();

    let entries = catalog
        .iter()
        .filter(|entry| {
            let name = entry.name.to_lowercase();
            needles.iter().any(|needle| name.contains(needle.as_str()))
        })
        .cloned()
        .collect();

    ProductCatalog::new(entries)
}

fn url_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed.host_str().map(|host| match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        })
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
