use crate::blueprint::validator::{self, ValidationReport};
use crate::blueprint::{
    Blueprint, BlueprintMetadata, Condition, Connection, Filter, ModuleId, ModuleNode,
    NodeMetadata, Operator, Route, Scheduling, Settings, Variable, BLUEPRINT_VERSION,
    ROUTER_MODULE,
};
use crate::error::BlueprintError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const DEFAULT_NAME: &str = "Generated Scenario";
pub const DEFAULT_DESCRIPTION: &str = "Created by flowsketch";

/// Field tested by a route whose condition could not be split.
pub const FALLBACK_ROUTE_FIELD: &str = "{{previousModule.status}}";

static CONDITION_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(.+?)\s+(is|equals|contains|greater|less)(?:\s+than)?\s+(.+?)\s*$")
        .expect("condition split pattern")
});

/// Non-node data attached to a blueprint. Never consumes a module id.
#[derive(Debug, Clone, PartialEq)]
pub enum Auxiliary {
    Variable { name: String, value: Value },
    DataStore(Value),
    /// Lands in `settings.scheduling`.
    Schedule { interval: u32 },
    /// Shallow-merged into `settings`.
    Settings(Map<String, Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Empty,
    Accumulating,
}

/// 蓝图构建器
///
/// Ids are handed out from one counter starting at 1. Every appended node
/// is wired from the current chain tail. A router takes the incoming edge
/// but ends the chain: whatever is appended after it starts unconnected
/// unless the caller wires it with [`BlueprintBuilder::connect`].
pub struct BlueprintBuilder {
    name: String,
    description: String,
    modules: Vec<ModuleNode>,
    connections: Vec<Connection>,
    variables: Vec<Variable>,
    data_stores: Vec<Value>,
    settings: Option<Settings>,
    next_id: ModuleId,
    chain_tail: Option<ModuleId>,
}

impl BlueprintBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            modules: Vec::new(),
            connections: Vec::new(),
            variables: Vec::new(),
            data_stores: Vec::new(),
            settings: None,
            next_id: 1,
            chain_tail: None,
        }
    }

    pub fn set_metadata(&mut self, name: &str, description: &str) {
        self.name = name.to_string();
        self.description = description.to_string();
    }

    pub fn state(&self) -> BuildState {
        if self.modules.is_empty()
            && self.connections.is_empty()
            && self.variables.is_empty()
            && self.data_stores.is_empty()
            && self.settings.is_none()
        {
            BuildState::Empty
        } else {
            BuildState::Accumulating
        }
    }

    pub fn append_module(
        &mut self,
        module_type: &str,
        version: u32,
        parameters: Map<String, Value>,
    ) -> ModuleId {
        let id = self.allocate_id();
        debug!(id, module = module_type, "Appending module");
        self.push_node(ModuleNode {
            id,
            module: module_type.to_string(),
            version,
            parameters,
            mapper: Some(Map::new()),
            metadata: Some(NodeMetadata::for_position(id)),
            routes: None,
        });
        self.chain_tail = Some(id);
        id
    }

    pub fn append_router(&mut self, routes: Vec<Route>) -> ModuleId {
        self.append_router_with_version(routes, 1)
    }

    pub fn append_router_with_version(&mut self, routes: Vec<Route>, version: u32) -> ModuleId {
        let id = self.allocate_id();
        debug!(id, routes = routes.len(), "Appending router");
        self.push_node(ModuleNode {
            id,
            module: ROUTER_MODULE.to_string(),
            version,
            parameters: Map::new(),
            mapper: Some(Map::new()),
            metadata: Some(NodeMetadata::for_position(id)),
            routes: Some(routes),
        });
        // Branching continues through routes only.
        self.chain_tail = None;
        id
    }

    /// Appends a router whose routes are derived from condition clauses.
    pub fn append_condition_router<S: AsRef<str>>(&mut self, conditions: &[S]) -> ModuleId {
        self.append_router(routes_from_conditions(conditions))
    }

    pub fn append_auxiliary(&mut self, auxiliary: Auxiliary) {
        match auxiliary {
            Auxiliary::Variable { name, value } => self.variables.push(Variable { name, value }),
            Auxiliary::DataStore(store) => self.data_stores.push(store),
            Auxiliary::Schedule { interval } => {
                self.settings.get_or_insert_with(Settings::default).scheduling =
                    Some(Scheduling { interval });
            }
            Auxiliary::Settings(map) => {
                let settings = self.settings.get_or_insert_with(Settings::default);
                for (k, v) in map {
                    if k == "scheduling" {
                        match serde_json::from_value::<Scheduling>(v.clone()) {
                            Ok(s) => {
                                settings.scheduling = Some(s);
                                continue;
                            }
                            Err(e) => warn!(error = %e, "Ignoring malformed scheduling setting"),
                        }
                    }
                    settings.extra.insert(k, v);
                }
            }
        }
    }

    /// Records an explicit edge. An identical edge is only stored once;
    /// endpoints are checked by `build`.
    ///
    /// A router branches only through its routes, so an edge leaving a
    /// router must name one. Returns `false` (and records nothing) for an
    /// unlabelled edge out of a router.
    pub fn connect(&mut self, source: ModuleId, target: ModuleId, route: Option<&str>) -> bool {
        let from_router = self.modules.iter().any(|m| m.id == source && m.is_router());
        if from_router && route.is_none() {
            warn!(source, target, "Refusing unlabelled connection out of a router");
            return false;
        }

        let connection = Connection {
            source,
            target,
            route: route.map(|label| Value::String(label.to_string())),
        };
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
        true
    }

    /// Replaces a node's mapper. Returns `false` if no node has that id.
    pub fn set_mapper(&mut self, id: ModuleId, mapper: Map<String, Value>) -> bool {
        match self.modules.iter_mut().find(|m| m.id == id) {
            Some(node) => {
                node.mapper = Some(mapper);
                true
            }
            None => false,
        }
    }

    pub fn modules(&self) -> &[ModuleNode] {
        &self.modules
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Runs the structural checks without consuming the builder.
    pub fn validate(&self) -> ValidationReport {
        validator::check(&self.modules, &self.connections)
    }

    pub fn build(self) -> Result<Blueprint, BlueprintError> {
        let report = self.validate();
        if !report.valid {
            warn!(errors = ?report.errors, "Blueprint rejected");
            return Err(BlueprintError::Validation {
                errors: report.errors,
            });
        }

        Ok(Blueprint {
            metadata: BlueprintMetadata {
                version: BLUEPRINT_VERSION,
                name: self.name,
                description: self.description,
            },
            scheduling: None,
            modules: self.modules,
            connections: self.connections,
            variables: self.variables,
            data_stores: self.data_stores,
            settings: self.settings,
        })
    }

    fn allocate_id(&mut self) -> ModuleId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_node(&mut self, node: ModuleNode) {
        if let Some(prev) = self.chain_tail {
            self.connections.push(Connection {
                source: prev,
                target: node.id,
                route: None,
            });
        }
        self.modules.push(node);
    }
}

impl Default for BlueprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One route per condition, labelled "Route 1", "Route 2", ... in input order.
///
/// `"<field> <operator> <value>"` becomes a predicate on
/// `{{previousModule.<field>}}`; anything else tests the status field for `"true"`.
pub fn routes_from_conditions<S: AsRef<str>>(conditions: &[S]) -> Vec<Route> {
    conditions
        .iter()
        .enumerate()
        .map(|(index, condition)| {
            let label = format!("Route {}", index + 1);
            let predicate = match CONDITION_SPLIT.captures(condition.as_ref()) {
                Some(caps) => Condition {
                    a: format!("{{{{previousModule.{}}}}}", caps[1].trim()),
                    b: caps[3].trim().to_string(),
                    o: Operator::from_word(&caps[2]),
                },
                None => Condition {
                    a: FALLBACK_ROUTE_FIELD.to_string(),
                    b: "true".to_string(),
                    o: Operator::Equal,
                },
            };
            Route {
                id: index as u32 + 1,
                filter: Filter {
                    name: label.clone(),
                    conditions: vec![vec![predicate]],
                },
                label,
            }
        })
        .collect()
}
