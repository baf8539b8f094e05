use crate::blueprint::Blueprint;
use crate::catalog::Catalog;
use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::Path;

pub fn load_description(file_path: &Path) -> Result<String> {
    fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read description from {}", file_path.display()))
}

pub fn load_catalog_from_yaml(file_path: &Path) -> Result<Catalog> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read catalog YAML from {}", file_path.display()))?;

    let catalog = Catalog::from_yaml_str(&yaml_content)
        .with_context(|| format!("Failed to load catalog from {}", file_path.display()))?;

    Ok(catalog)
}

pub fn load_blueprint_from_json(file_path: &Path) -> Result<Blueprint> {
    let json_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read blueprint from {}", file_path.display()))?;

    let blueprint: Blueprint = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to deserialize blueprint JSON from {}", file_path.display()))?;

    Ok(blueprint)
}

pub fn write_blueprint(file_path: &Path, blueprint: &Blueprint) -> Result<()> {
    let json = blueprint.to_json_pretty()?;
    fs::write(file_path, json)
        .with_context(|| format!("Failed to write blueprint to {}", file_path.display()))
}
