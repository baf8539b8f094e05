pub mod builder;
pub mod validator;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ModuleId = u32;

/// Blueprint format version understood by the target platform.
pub const BLUEPRINT_VERSION: u32 = 2;

/// Module identifier used for branch points.
pub const ROUTER_MODULE: &str = "flow.router";

/// Horizontal spacing between nodes in the designer layout.
pub const LAYOUT_SPACING: i32 = 300;

/// 生成的蓝图 (可导入目标平台的完整工作流图)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blueprint {
    pub metadata: BlueprintMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Scheduling>,
    pub modules: Vec<ModuleNode>,
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, rename = "dataStores", skip_serializing_if = "Vec::is_empty")]
    pub data_stores: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlueprintMetadata {
    pub version: u32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scheduling {
    /// Seconds between runs.
    pub interval: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Scheduling>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

/// 蓝图节点
///
/// A router is a node whose `routes` is `Some`; its `parameters` stay empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleNode {
    pub id: ModuleId,
    /// `"service.operation"`
    pub module: String,
    pub version: u32,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
}

impl ModuleNode {
    pub fn is_router(&self) -> bool {
        self.routes.is_some()
    }

    /// Service half of the module identifier (`"slack"` for `"slack.postMessage"`).
    pub fn service(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeMetadata {
    pub designer: Designer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Designer {
    pub x: i32,
    pub y: i32,
}

impl NodeMetadata {
    /// Left-to-right placement derived from the node id.
    pub fn for_position(id: ModuleId) -> Self {
        Self {
            designer: Designer {
                x: LAYOUT_SPACING * (id as i32 - 1),
                y: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: u32,
    pub label: String,
    pub filter: Filter,
}

impl Route {
    /// The single predicate this route tests.
    pub fn predicate(&self) -> Option<&Condition> {
        self.filter.conditions.first().and_then(|group| group.first())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filter {
    pub name: String,
    /// OR of AND-groups, as the platform expects.
    pub conditions: Vec<Vec<Condition>>,
}

/// `a <o> b`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub a: String,
    pub b: String,
    pub o: Operator,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equal,
    Contains,
    Greater,
    Less,
}

impl Operator {
    /// Maps an operator word from a condition clause. Unknown words compare for equality.
    pub fn from_word(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "is" | "equals" => Operator::Equal,
            "contains" => Operator::Contains,
            "greater" => Operator::Greater,
            "less" => Operator::Less,
            _ => Operator::Equal,
        }
    }
}

/// 有向连接
///
/// Endpoints are plain module ids. `route` is free-form: the builder writes
/// a route label string, imported blueprints may carry any JSON value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub source: ModuleId,
    pub target: ModuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Value>,
}

impl Connection {
    /// The route as a label, when it is a string.
    pub fn route_label(&self) -> Option<&str> {
        self.route.as_ref().and_then(Value::as_str)
    }
}

impl Blueprint {
    pub fn module(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn routers(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules.iter().filter(|m| m.is_router())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
