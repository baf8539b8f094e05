use crate::blueprint::{Blueprint, Connection, ModuleId, ModuleNode};
use serde::Serialize;
use std::collections::HashSet;

pub const NO_MODULES_ERROR: &str = "Scenario must have at least one module";
pub const DUPLICATE_IDS_ERROR: &str = "Duplicate module IDs found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Structural checks only. Parameters, placeholders and module
/// compatibility are never inspected.
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, blueprint: &Blueprint) -> ValidationReport {
        check(&blueprint.modules, &blueprint.connections)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check(modules: &[ModuleNode], connections: &[Connection]) -> ValidationReport {
    let mut errors = Vec::new();

    if modules.is_empty() {
        errors.push(NO_MODULES_ERROR.to_string());
    }

    let ids: HashSet<ModuleId> = modules.iter().map(|m| m.id).collect();
    if ids.len() != modules.len() {
        errors.push(DUPLICATE_IDS_ERROR.to_string());
    }

    for conn in connections {
        if !ids.contains(&conn.source) || !ids.contains(&conn.target) {
            errors.push(format!(
                "Invalid connection: {} -> {}",
                conn.source, conn.target
            ));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
