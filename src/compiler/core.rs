use crate::blueprint::builder::{
    routes_from_conditions, Auxiliary, BlueprintBuilder, DEFAULT_DESCRIPTION, DEFAULT_NAME,
};
use crate::blueprint::Blueprint;
use crate::catalog::Catalog;
use crate::compiler::extractor::{extract_schedule, normalize, Extractor};
use crate::compiler::resolver::Resolver;
use crate::error::{BlueprintError, CatalogError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of leading words used for a derived scenario name.
const NAME_WORDS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Overrides the name derived from the description.
    pub name: Option<String>,
    pub variables: Vec<(String, Value)>,
    /// Overrides any schedule phrase found in the description.
    pub schedule_interval: Option<u32>,
}

/// 编译器: description text -> Blueprint
///
/// Runs extraction, resolution, assembly and validation in one call.
/// Holds only read-only tables, so one instance can serve many requests.
pub struct Compiler {
    extractor: Extractor,
    resolver: Resolver,
}

impl Compiler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_extractor(Extractor::new(), catalog)
    }

    /// Compiler backed by the catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(Arc::new(Catalog::builtin()?)))
    }

    pub fn with_extractor(extractor: Extractor, catalog: Arc<Catalog>) -> Self {
        Self {
            extractor,
            resolver: Resolver::new(catalog),
        }
    }

    pub fn compile(&self, description: &str) -> Result<Blueprint, BlueprintError> {
        self.compile_with(description, &CompileOptions::default())
    }

    pub fn compile_with(
        &self,
        description: &str,
        options: &CompileOptions,
    ) -> Result<Blueprint, BlueprintError> {
        let mut builder = BlueprintBuilder::new();
        let name = options
            .name
            .clone()
            .or_else(|| scenario_name(description))
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        let summary = match description.trim() {
            "" => DEFAULT_DESCRIPTION,
            text => text,
        };
        builder.set_metadata(&name, summary);

        // 1. Extract
        let extraction = self.extractor.extract(description);

        // 2. Resolve + assemble. Blank input yields no modules and is rejected by build.
        if !normalize(description).is_empty() {
            let trigger = match &extraction.trigger {
                Some(clause) => self.resolver.resolve_trigger(&clause.text),
                None => {
                    debug!("No trigger phrase matched; using webhook trigger");
                    self.resolver.fallback_trigger()
                }
            };
            builder.append_module(&trigger.module, trigger.version, trigger.parameters);
        }

        for action in &extraction.actions {
            let choice = self.resolver.resolve_action(&action.text);
            debug!(clause = %action.text, module = %choice.module, "Action resolved");
            builder.append_module(&choice.module, choice.version, choice.parameters);
        }

        if !extraction.conditions.is_empty() {
            let texts: Vec<&str> = extraction.conditions.iter().map(|c| c.text.as_str()).collect();
            builder.append_router_with_version(
                routes_from_conditions(&texts),
                self.resolver.router_version(),
            );
        }

        for (name, value) in &options.variables {
            builder.append_auxiliary(Auxiliary::Variable {
                name: name.clone(),
                value: value.clone(),
            });
        }

        if let Some(interval) = options.schedule_interval.or_else(|| extract_schedule(description)) {
            builder.append_auxiliary(Auxiliary::Schedule { interval });
        }

        // 3. Validate
        let blueprint = builder.build()?;
        info!(
            name = %blueprint.metadata.name,
            modules = blueprint.modules.len(),
            connections = blueprint.connections.len(),
            "Compiled blueprint"
        );
        Ok(blueprint)
    }
}

/// First few words of the description with punctuation stripped.
pub fn scenario_name(description: &str) -> Option<String> {
    let name = description
        .split_whitespace()
        .take(NAME_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>();
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
