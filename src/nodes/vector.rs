//! Vector split / combine nodes.

use crate::compiler::EvalContext;
use crate::error::Result;
use crate::graph::Node;
use crate::value::{NodeResult, ResultType, ShaderValue};

const LANES: [&str; 4] = ["X", "Y", "Z", "W"];

/// Compile a SplitVector node.
///
/// # Inputs
/// - `Input`: required scalar or vector
///
/// # Output
/// - `X`, `Y`, `Z`, `W`: one lane each; lanes past the input's width read as `0.0`
pub fn compile_split(node: &Node, output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if !node.is_connected("Input") {
        return Ok(NodeResult::missing_input("Input"));
    }
    let v = ctx.result(&node.input("Input"))?;
    if !v.is_valid() {
        return Ok(NodeResult::missing_input("Input"));
    }
    if !v.ty.is_castable() {
        return Ok(NodeResult::error("SplitVector input must be a scalar or vector"));
    }
    let Some(lane) = LANES.iter().position(|l| *l == output) else {
        return Ok(NodeResult::error(format!("SplitVector has no output '{output}'")));
    };
    if lane >= v.components() {
        return Ok(NodeResult::constant(ResultType::Float, "0.0"));
    }
    let code = if v.components() == 1 {
        v.code.clone()
    } else {
        format!("{}.{}", v.code, output.to_ascii_lowercase())
    };
    Ok(if v.constant {
        NodeResult::constant(ResultType::Float, code)
    } else {
        NodeResult::new(ResultType::Float, code)
    })
}

/// Compile a CombineVector node.
///
/// # Inputs
/// - `X`, `Y`, `Z`, `W`: scalars, `0.0` when unconnected; wider inputs use their first lane
///
/// # Output
/// - `XYZW`, `XYZ`, `XY`: the leading lanes as a vector
pub fn compile_combine(node: &Node, output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let width = match output {
        "XYZW" => 4,
        "XYZ" => 3,
        "XY" => 2,
        other => {
            return Ok(NodeResult::error(format!("CombineVector has no output '{other}'")));
        }
    };

    let mut lanes = Vec::with_capacity(width);
    let mut constant = true;
    for lane in &LANES[..width] {
        let r = ctx.result_or(&node.input(lane), ShaderValue::Float(0.0))?;
        if !r.ty.is_castable() {
            return Ok(NodeResult::error(format!(
                "CombineVector input {lane} must be a scalar or vector"
            )));
        }
        constant &= r.constant;
        lanes.push(r.cast(1, 0.0)?);
    }

    let ty = ResultType::from_components(width);
    let code = format!("{}( {} )", ty.hlsl()?, lanes.join(", "));
    Ok(if constant {
        NodeResult::constant(ty, code)
    } else {
        NodeResult::new(ty, code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_utils::compile_output;
    use serde_json::json;

    #[test]
    fn split_selects_one_lane() {
        let nodes = vec![
            Node::new("p", "WorldPosition"),
            Node::new("s", "SplitVector").with_input("Input", "p", "Result"),
        ];
        assert_eq!(compile_output(nodes.clone(), "s", "Y").code, "l_0.y");
        assert_eq!(
            compile_output(nodes, "s", "W"),
            NodeResult::constant(ResultType::Float, "0.0")
        );
    }

    #[test]
    fn combine_casts_inputs_to_scalars() {
        let r = compile_output(
            vec![
                Node::new("f", "Float").with_param("value", json!(0.5)),
                Node::new("c", "Color"),
                Node::new("v", "CombineVector")
                    .with_input("X", "f", "Result")
                    .with_input("Y", "c", "Result"),
            ],
            "v",
            "XYZ",
        );
        assert_eq!(
            r,
            NodeResult::constant(
                ResultType::Vector3,
                "float3( 0.5, float4( 1.0, 1.0, 1.0, 1.0 ).x, 0.0 )"
            )
        );
    }
}
