//! Gradient nodes.

use crate::compiler::EvalContext;
use crate::error::Result;
use crate::graph::{Node, parse_f32, parse_str, parse_struct};
use crate::resources::Gradient;
use crate::value::{NodeResult, ResultType, ShaderValue};

/// A gradient local built from the `gradient` param (`{ blend, colors, alphas }`).
/// Unnamed gradients are named after the node.
pub fn compile_gradient(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let gradient: Gradient = parse_struct(&node.params, "gradient").unwrap_or_default();
    let name = parse_str(&node.params, "name").unwrap_or_default();
    Ok(ctx.register_gradient(name, gradient))
}

/// Compile a SampleGradient node.
///
/// # Inputs
/// - `Gradient`: required gradient
/// - `Time`: position along the gradient, defaults to the `time` param
///
/// # Output
/// - `Result`: float4 colour
pub fn compile_sample_gradient(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if !node.is_connected("Gradient") {
        return Ok(NodeResult::missing_input("Gradient"));
    }
    let gradient = ctx.result(&node.input("Gradient"))?;
    if !gradient.is_valid() {
        return Ok(NodeResult::missing_input("Gradient"));
    }
    if gradient.ty != ResultType::Gradient || ctx.gradient(&gradient.code).is_none() {
        return Ok(NodeResult::error("Gradient input must be a gradient"));
    }

    let time = ctx.result_or(
        &node.input("Time"),
        ShaderValue::Float(parse_f32(&node.params, "time").unwrap_or(0.0)),
    )?;
    if !time.ty.is_castable() {
        return Ok(NodeResult::error("Time input must be a scalar"));
    }
    Ok(NodeResult::new(
        ResultType::Color,
        format!("Gradient::SampleGradient( {}, {} )", gradient.code, time.cast(1, 0.0)?),
    ))
}
