use crate::error::CatalogError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Schema version assumed for any module the catalog does not list.
pub const DEFAULT_MODULE_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("modules.yaml");

/// 模块目录 (只读参考表)
///
/// Keyed by `"service.operation"`. Built once and then only read; the
/// resolver receives it by reference so several catalogs can coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub version: u32,
    pub category: String,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    categories: BTreeMap<String, RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    // app -> operation -> module
    #[serde(default)]
    modules: BTreeMap<String, BTreeMap<String, RawModule>>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    version: u32,
    #[serde(default)]
    label: Option<String>,
}

impl Catalog {
    /// Empty catalog. Every lookup falls back to `DEFAULT_MODULE_VERSION`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference table shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_yaml::from_str(yaml)?;
        let mut entries = BTreeMap::new();

        for (category, body) in raw.categories {
            for (app, operations) in body.modules {
                for (operation, module) in operations {
                    let key = format!("{}.{}", app, operation);
                    if !is_module_key(&app, &operation) {
                        return Err(CatalogError::InvalidEntry(key));
                    }
                    if module.version == 0 {
                        return Err(CatalogError::InvalidVersion { module: key });
                    }
                    // First declaration wins when an app shows up in two categories.
                    entries.entry(key).or_insert(CatalogEntry {
                        version: module.version,
                        category: category.clone(),
                        label: module.label,
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// Adds or replaces one entry. Intended for assembling catalogs in code.
    pub fn with_module(mut self, module: &str, version: u32) -> Self {
        self.entries.insert(
            module.to_string(),
            CatalogEntry {
                version,
                category: "custom".to_string(),
                label: None,
            },
        );
        self
    }

    /// Exact lookup of `"service.operation"`; unknown identifiers get version 1.
    pub fn version_of(&self, module: &str) -> u32 {
        self.entries
            .get(module)
            .map(|e| e.version)
            .unwrap_or(DEFAULT_MODULE_VERSION)
    }

    pub fn get(&self, module: &str) -> Option<&CatalogEntry> {
        self.entries.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by identifier.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn is_module_key(app: &str, operation: &str) -> bool {
    !app.is_empty() && !operation.is_empty() && !app.contains('.') && !operation.contains('.')
}
