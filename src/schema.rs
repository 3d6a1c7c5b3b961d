use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde::Deserialize;

const DEFAULT_NODE_SCHEME_JSON: &str = include_str!("../assets/node-scheme.json");

/// Per node-type defaults bundled with the compiler.
#[derive(Debug, Clone)]
pub struct NodeScheme {
    pub nodes: HashMap<String, NodeTypeScheme>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawNodeScheme {
    #[serde(rename = "schemaVersion")]
    #[allow(dead_code)]
    schema_version: u32,
    #[serde(default)]
    nodes: Vec<RawNodeDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawNodeDef {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "defaultParams", default)]
    default_params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NodeTypeScheme {
    pub category: Option<String>,
    pub default_params: HashMap<String, serde_json::Value>,
}

impl NodeScheme {
    pub fn default_params(&self, node_type: &str) -> Option<&HashMap<String, serde_json::Value>> {
        self.nodes
            .get(node_type)
            .map(|n| &n.default_params)
            .filter(|p| !p.is_empty())
    }

    pub fn category(&self, node_type: &str) -> Option<&str> {
        self.nodes.get(node_type).and_then(|n| n.category.as_deref())
    }
}

pub fn load_default_scheme() -> Result<NodeScheme> {
    let raw: RawNodeScheme = serde_json::from_str(DEFAULT_NODE_SCHEME_JSON)
        .map_err(|e| anyhow!("failed to parse assets/node-scheme.json: {e}"))?;
    let nodes = raw
        .nodes
        .into_iter()
        .map(|n| {
            (
                n.node_type,
                NodeTypeScheme {
                    category: n.category,
                    default_params: n.default_params,
                },
            )
        })
        .collect();
    Ok(NodeScheme { nodes })
}
