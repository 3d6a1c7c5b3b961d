//! The Result node: material inputs the graph writes to.

use super::InputDef;
use crate::compiler::{EvalContext, Stage};
use crate::error::Result;
use crate::graph::{Node, ShaderDomain};
use crate::value::{NodeResult, ResultType};

pub const SURFACE_INPUTS: &[InputDef] = &[
    InputDef::new("Albedo", ResultType::Vector3),
    InputDef::new("Emission", ResultType::Vector3),
    InputDef::new("Opacity", ResultType::Float),
    InputDef::new("Normal", ResultType::Vector3),
    InputDef::new("Roughness", ResultType::Float),
    InputDef::new("Metalness", ResultType::Float),
    InputDef::new("AmbientOcclusion", ResultType::Float),
    InputDef::new("PositionOffset", ResultType::Vector3),
];

pub const POST_PROCESS_INPUTS: &[InputDef] = &[InputDef::new("Color", ResultType::Color)];

pub fn material_inputs(domain: ShaderDomain) -> &'static [InputDef] {
    match domain {
        ShaderDomain::Surface => SURFACE_INPUTS,
        ShaderDomain::PostProcess => POST_PROCESS_INPUTS,
    }
}

/// Stage whose body the input is written in.
pub fn input_stage(name: &str) -> Stage {
    match name {
        "PositionOffset" => Stage::Vertex,
        _ => Stage::Pixel,
    }
}

/// Statement writing `expr` (already cast to the input's width) to the material.
pub fn assignment(domain: ShaderDomain, name: &str, expr: &str) -> String {
    match (domain, name) {
        (ShaderDomain::PostProcess, _) => format!("color = {expr};"),
        (ShaderDomain::Surface, "PositionOffset") => format!("i.vPositionWs.xyz += {expr};"),
        (ShaderDomain::Surface, "Normal") => {
            format!("m.Normal = TransformNormal( {expr}, i.vNormalWs, i.vTangentUWs, i.vTangentVWs );")
        }
        (ShaderDomain::Surface, _) => format!("m.{name} = {expr};"),
    }
}

/// The Result node produces nothing itself; its inputs are read by the compiler.
pub fn compile_result(_node: &Node, _output: &str, _ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    Ok(NodeResult::new(ResultType::Void, ""))
}
