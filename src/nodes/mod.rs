//! Node library.
//!
//! Every node type is a [`NodeDefinition`]: its typed input sockets, its output
//! socket names, and one compile function that produces the [`NodeResult`] for a
//! requested output. Compile functions resolve their inputs through the
//! [`EvalContext`], which memoizes per input socket.

pub mod constants;
pub mod functions;
pub mod gradient;
pub mod math;
pub mod result;
pub mod shader_inputs;
pub mod switch;
pub mod texture;
pub mod vector;

use crate::compiler::EvalContext;
use crate::error::Result;
use crate::graph::Node;
use crate::value::{NodeResult, ResultType};

/// One typed input socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputDef {
    pub name: &'static str,
    pub ty: ResultType,
}

impl InputDef {
    pub const fn new(name: &'static str, ty: ResultType) -> Self {
        Self { name, ty }
    }
}

pub type CompileFn = fn(&Node, &str, &mut EvalContext<'_, '_>) -> Result<NodeResult>;

pub struct NodeDefinition {
    pub name: &'static str,
    pub inputs: &'static [InputDef],
    pub outputs: &'static [&'static str],
    pub compile: CompileFn,
}

impl std::fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

const RESULT: &[&str] = &["Result"];

const A_B: &[InputDef] = &[
    InputDef::new("A", ResultType::Color),
    InputDef::new("B", ResultType::Color),
];

const SINGLE: &[InputDef] = &[InputDef::new("Input", ResultType::Color)];

macro_rules! node {
    ($name:literal, $inputs:expr, $outputs:expr, $compile:path) => {
        NodeDefinition {
            name: $name,
            inputs: $inputs,
            outputs: $outputs,
            compile: $compile,
        }
    };
}

pub static NODE_DEFINITIONS: &[NodeDefinition] = &[
    // Constants
    node!("Float", &[], RESULT, constants::compile_constant),
    node!("Float2", &[], RESULT, constants::compile_constant),
    node!("Float3", &[], RESULT, constants::compile_constant),
    node!("Float4", &[], RESULT, constants::compile_constant),
    node!("Color", &[], RESULT, constants::compile_constant),
    node!("Bool", &[], RESULT, constants::compile_constant),
    node!("Float4x4", &[], RESULT, constants::compile_constant),
    // Math
    node!("Add", A_B, RESULT, math::compile_binary),
    node!("Subtract", A_B, RESULT, math::compile_binary),
    node!("Multiply", A_B, RESULT, math::compile_binary),
    node!("Divide", A_B, RESULT, math::compile_binary),
    node!("Min", A_B, RESULT, math::compile_binary),
    node!("Max", A_B, RESULT, math::compile_binary),
    node!("Power", A_B, RESULT, math::compile_binary),
    node!("DotProduct", A_B, RESULT, math::compile_binary),
    node!(
        "Lerp",
        &[
            InputDef::new("A", ResultType::Color),
            InputDef::new("B", ResultType::Color),
            InputDef::new("C", ResultType::Float),
        ],
        RESULT,
        math::compile_lerp
    ),
    node!("Saturate", SINGLE, RESULT, math::compile_unary),
    node!("OneMinus", SINGLE, RESULT, math::compile_unary),
    node!("Abs", SINGLE, RESULT, math::compile_unary),
    node!("Sin", SINGLE, RESULT, math::compile_unary),
    node!("Cos", SINGLE, RESULT, math::compile_unary),
    node!("Normalize", SINGLE, RESULT, math::compile_unary),
    // Vectors
    node!(
        "SplitVector",
        SINGLE,
        &["X", "Y", "Z", "W"],
        vector::compile_split
    ),
    node!(
        "CombineVector",
        &[
            InputDef::new("X", ResultType::Float),
            InputDef::new("Y", ResultType::Float),
            InputDef::new("Z", ResultType::Float),
            InputDef::new("W", ResultType::Float),
        ],
        &["XYZW", "XYZ", "XY"],
        vector::compile_combine
    ),
    // Shader inputs
    node!("Time", &[], RESULT, shader_inputs::compile_time),
    node!("TexCoord", &[], RESULT, shader_inputs::compile_tex_coord),
    node!("WorldPosition", &[], RESULT, shader_inputs::compile_world_position),
    node!("WorldNormal", &[], RESULT, shader_inputs::compile_world_normal),
    node!("VertexColor", &[], &["RGBA", "RGB", "A"], shader_inputs::compile_vertex_color),
    // Textures
    node!("SamplerState", &[], RESULT, texture::compile_sampler),
    node!("TextureObject", &[], RESULT, texture::compile_texture_object),
    node!(
        "TextureSample",
        &[
            InputDef::new("Coords", ResultType::Vector2),
            InputDef::new("Sampler", ResultType::Sampler),
            InputDef::new("Texture", ResultType::Texture2D),
        ],
        &["RGBA", "R", "G", "B", "A"],
        texture::compile_texture_sample
    ),
    // Functions
    node!("CustomFunction", &[], RESULT, functions::compile_custom_function),
    node!(
        "SimpleNoise",
        &[InputDef::new("Coords", ResultType::Vector2)],
        RESULT,
        functions::compile_simple_noise
    ),
    // Gradients
    node!("Gradient", &[], RESULT, gradient::compile_gradient),
    node!(
        "SampleGradient",
        &[
            InputDef::new("Gradient", ResultType::Gradient),
            InputDef::new("Time", ResultType::Float),
        ],
        RESULT,
        gradient::compile_sample_gradient
    ),
    // Static switches
    node!(
        "StaticSwitch",
        &[
            InputDef::new("True", ResultType::Color),
            InputDef::new("False", ResultType::Color),
        ],
        RESULT,
        switch::compile_static_switch
    ),
    node!(
        "StaticSwitchReference",
        &[
            InputDef::new("True", ResultType::Color),
            InputDef::new("False", ResultType::Color),
        ],
        RESULT,
        switch::compile_static_switch_reference
    ),
    // Output
    node!("Result", result::SURFACE_INPUTS, &[], result::compile_result),
];

pub fn find_definition(node_type: &str) -> Option<&'static NodeDefinition> {
    NODE_DEFINITIONS.iter().find(|d| d.name == node_type)
}

/// Compile one output of `node`. Unknown types and outputs are node errors.
pub fn compile_node(node: &Node, output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let Some(def) = find_definition(&node.node_type) else {
        return Ok(NodeResult::error(format!(
            "Unknown node type '{}'",
            node.node_type
        )));
    };
    if !def.outputs.contains(&output) {
        return Ok(NodeResult::error(format!(
            "{} has no output '{output}'",
            def.name
        )));
    }
    (def.compile)(node, output, ctx)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::compiler::{CompileOptions, GraphCompiler, Stage};
    use crate::graph::{Node, ShaderGraph};
    use crate::value::NodeResult;

    pub fn graph(nodes: Vec<Node>) -> ShaderGraph {
        ShaderGraph {
            nodes,
            ..ShaderGraph::default()
        }
    }

    /// Compile `output` of node `id` in a fresh final-mode pixel context.
    pub fn compile_output(nodes: Vec<Node>, id: &str, output: &str) -> NodeResult {
        compile_output_with(nodes, id, output, CompileOptions::final_build(), Stage::Pixel)
    }

    pub fn compile_output_with(
        nodes: Vec<Node>,
        id: &str,
        output: &str,
        options: CompileOptions,
        stage: Stage,
    ) -> NodeResult {
        let graph = graph(nodes);
        let mut compiler = GraphCompiler::new(&graph, options);
        let node = graph.find_node(id).expect("node exists");
        compiler
            .context(stage)
            .evaluate(node, output)
            .expect("compile node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn definitions_have_unique_names() {
        let mut seen = HashSet::new();
        for def in NODE_DEFINITIONS {
            assert!(seen.insert(def.name), "duplicate node {}", def.name);
        }
    }

    #[test]
    fn unknown_outputs_are_errors() {
        let r = test_utils::compile_output(vec![Node::new("t", "Time")], "t", "Bogus");
        assert!(!r.is_valid());
        assert_eq!(r.errors, ["Time has no output 'Bogus'"]);
    }
}
