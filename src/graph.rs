use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::schema;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderDomain {
    #[default]
    Surface,
    PostProcess,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingModel {
    #[default]
    Lit,
    Unlit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Opaque,
    Masked,
    Translucent,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ShaderGraph {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub domain: ShaderDomain,
    #[serde(default, rename = "shadingModel")]
    pub shading_model: ShadingModel,
    #[serde(default, rename = "blendMode")]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: BTreeMap<String, NodeInput>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            params: HashMap::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn with_input(mut self, name: &str, from_node: &str, from_output: &str) -> Self {
        self.inputs
            .insert(name.to_string(), NodeInput::new(from_node, from_output));
        self
    }

    /// The connection of an input socket; unconnected sockets yield the empty input.
    pub fn input(&self, name: &str) -> NodeInput {
        self.inputs.get(name).cloned().unwrap_or_default()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.inputs.get(name).is_some_and(NodeInput::is_valid)
    }
}

/// Reference to another node's output socket.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeInput {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub output: String,
}

impl NodeInput {
    pub fn new(identifier: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            output: output.into(),
        }
    }

    /// Both ends named. Says nothing about whether the target still exists.
    pub fn is_valid(&self) -> bool {
        !self.identifier.is_empty() && !self.output.is_empty()
    }
}

impl std::fmt::Display for NodeInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.identifier, self.output)
    }
}

impl ShaderGraph {
    pub fn nodes_by_id(&self) -> HashMap<&str, &Node> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn result_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.node_type == "Result")
    }
}

pub fn load_graph_from_str(text: &str) -> Result<ShaderGraph> {
    let mut graph: ShaderGraph = serde_json::from_str(text).context("failed to parse shader graph json")?;
    normalize_graph_defaults(&mut graph)?;
    Ok(graph)
}

pub fn load_graph_from_path(path: impl AsRef<std::path::Path>) -> Result<ShaderGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader graph json at {}", path.display()))?;
    load_graph_from_str(&text).with_context(|| format!("invalid shader graph {}", path.display()))
}

/// Fill params the graph omits with the bundled node scheme's defaults.
pub fn normalize_graph_defaults(graph: &mut ShaderGraph) -> Result<()> {
    let scheme = schema::load_default_scheme()?;
    for node in &mut graph.nodes {
        let Some(defaults) = scheme.default_params(&node.node_type) else {
            continue;
        };
        let mut merged = defaults.clone();
        for (k, v) in std::mem::take(&mut node.params) {
            merged.insert(k, v);
        }
        node.params = merged;
    }
    Ok(())
}

pub fn parse_f32(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<f32> {
    params.get(key).and_then(json_f32)
}

pub fn parse_bool(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

pub fn parse_u32(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<u32> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
}

pub fn parse_str<'a>(params: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Read a numeric array, padding missing lanes with `fill`.
pub fn parse_vec<const N: usize>(
    params: &HashMap<String, serde_json::Value>,
    key: &str,
    fill: f32,
) -> Option<[f32; N]> {
    let arr = params.get(key)?.as_array()?;
    let mut out = [fill; N];
    for (slot, v) in out.iter_mut().zip(arr.iter()) {
        if let Some(x) = json_f32(v) {
            *slot = x;
        }
    }
    Some(out)
}

/// Deserialize a structured param, ignoring it when malformed.
pub fn parse_struct<T: serde::de::DeserializeOwned>(
    params: &HashMap<String, serde_json::Value>,
    key: &str,
) -> Option<T> {
    params
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn json_f32(v: &serde_json::Value) -> Option<f32> {
    v.as_f64()
        .map(|x| x as f32)
        .or_else(|| v.as_i64().map(|x| x as f32))
        .or_else(|| v.as_u64().map(|x| x as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unconnected_inputs_are_invalid() {
        let node = Node::new("a", "Add").with_input("A", "b", "Result");
        assert!(node.input("A").is_valid());
        assert!(!node.input("B").is_valid());
        assert!(!NodeInput::new("b", "").is_valid());
        assert!(!NodeInput::new("", "Result").is_valid());
    }

    #[test]
    fn loads_graph_json_and_applies_scheme_defaults() {
        let text = json!({
            "domain": "Surface",
            "nodes": [
                { "id": "f", "type": "Float", "params": { "value": 0.25 } },
                { "id": "r", "type": "Result", "inputs": { "Albedo": { "identifier": "f", "output": "Result" } } }
            ]
        })
        .to_string();
        let graph = load_graph_from_str(&text).unwrap();
        let f = graph.find_node("f").unwrap();
        assert_eq!(parse_f32(&f.params, "value"), Some(0.25));
        assert_eq!(parse_str(&f.params, "name"), Some(""));
        assert_eq!(graph.result_node().unwrap().input("Albedo"), NodeInput::new("f", "Result"));
    }

    #[test]
    fn parse_vec_pads_short_arrays() {
        let params = HashMap::from([("value".to_string(), json!([0.5, 1]))]);
        assert_eq!(parse_vec::<4>(&params, "value", 1.0), Some([0.5, 1.0, 1.0, 1.0]));
        assert_eq!(parse_vec::<2>(&params, "missing", 0.0), None);
    }
}
