use thiserror::Error;

/// 蓝图构建失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlueprintError {
    /// Structural validation rejected the graph. Carries every itemized error.
    #[error("Invalid scenario: {}", errors.join(", "))]
    Validation { errors: Vec<String> },
}

impl BlueprintError {
    pub fn errors(&self) -> &[String] {
        match self {
            BlueprintError::Validation { errors } => errors,
        }
    }
}

/// Errors raised while loading a module catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse catalog YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Catalog entry '{0}' is not a valid \"service.operation\" identifier")]
    InvalidEntry(String),

    #[error("Catalog entry '{module}' declares version 0; versions start at 1")]
    InvalidVersion { module: String },
}
