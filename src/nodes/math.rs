//! Math nodes.

use crate::compiler::EvalContext;
use crate::error::Result;
use crate::graph::{Node, parse_f32};
use crate::value::{NodeResult, ResultType, ShaderValue};

fn default_operand(node: &Node, key: &str) -> f32 {
    let fallback = match node.node_type.as_str() {
        "Multiply" | "Divide" | "Power" => 1.0,
        _ => 0.0,
    };
    parse_f32(&node.params, key).unwrap_or(fallback)
}

fn non_vector_error(node: &Node) -> NodeResult {
    NodeResult::error(format!(
        "{} inputs must be scalars or vectors",
        node.node_type
    ))
}

/// Vector kind of a value; bools are treated as floats once they take part in math.
fn numeric_type(r: &NodeResult) -> ResultType {
    ResultType::from_components(r.components())
}

/// Compile a two-operand math node (Add, Subtract, Multiply, Divide, Min, Max,
/// Power, DotProduct).
///
/// # Inputs
/// - `A`, `B`: operands; unconnected ones use `defaultA` / `defaultB`
///
/// # Output
/// - `Result`: the wider operand's kind (DotProduct is always a float)
///
/// # Example
/// ```hlsl
/// ( l_0 + float3( 0.5, 0.5, 0.5 ) )
/// ```
pub fn compile_binary(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let (a, b) = ctx.result_pair(
        &node.input("A"),
        &node.input("B"),
        ShaderValue::Float(default_operand(node, "defaultA")),
        ShaderValue::Float(default_operand(node, "defaultB")),
    )?;
    if !a.ty.is_castable() || !b.ty.is_castable() {
        return Ok(non_vector_error(node));
    }

    let (x, y) = (&a.code, &b.code);
    let (code, ty) = match node.node_type.as_str() {
        "Add" => (format!("( {x} + {y} )"), numeric_type(&a)),
        "Subtract" => (format!("( {x} - {y} )"), numeric_type(&a)),
        "Multiply" => (format!("( {x} * {y} )"), numeric_type(&a)),
        "Divide" => (format!("( {x} / {y} )"), numeric_type(&a)),
        "Min" => (format!("min( {x}, {y} )"), numeric_type(&a)),
        "Max" => (format!("max( {x}, {y} )"), numeric_type(&a)),
        "Power" => (format!("pow( {x}, {y} )"), numeric_type(&a)),
        "DotProduct" => (format!("dot( {x}, {y} )"), ResultType::Float),
        other => {
            return Ok(NodeResult::error(format!("{other} is not a binary math node")));
        }
    };
    Ok(if a.constant && b.constant {
        NodeResult::constant(ty, code)
    } else {
        NodeResult::new(ty, code)
    })
}

/// Compile a Lerp node.
///
/// # Inputs
/// - `A`, `B`: endpoints, defaulting to `defaultA` / `defaultB`
/// - `C`: blend factor, defaulting to `fraction`
///
/// # Output
/// - `Result`: `lerp( A, B, C )` at the endpoints' width
pub fn compile_lerp(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let (a, b) = ctx.result_pair(
        &node.input("A"),
        &node.input("B"),
        ShaderValue::Float(parse_f32(&node.params, "defaultA").unwrap_or(0.0)),
        ShaderValue::Float(parse_f32(&node.params, "defaultB").unwrap_or(1.0)),
    )?;
    let c = ctx.result_or(
        &node.input("C"),
        ShaderValue::Float(parse_f32(&node.params, "fraction").unwrap_or(0.5)),
    )?;
    if !a.ty.is_castable() || !b.ty.is_castable() || !c.ty.is_castable() {
        return Ok(non_vector_error(node));
    }

    let fraction = if c.components() == 1 {
        c.code.clone()
    } else {
        c.cast(a.components(), 0.0)?
    };
    let code = format!("lerp( {}, {}, {fraction} )", a.code, b.code);
    let ty = numeric_type(&a);
    Ok(if a.constant && b.constant && c.constant {
        NodeResult::constant(ty, code)
    } else {
        NodeResult::new(ty, code)
    })
}

/// Compile a one-operand math node (Saturate, OneMinus, Abs, Sin, Cos, Normalize).
///
/// # Inputs
/// - `Input`: required
///
/// # Output
/// - `Result`: same width as the input
pub fn compile_unary(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if !node.is_connected("Input") {
        return Ok(NodeResult::missing_input("Input"));
    }
    let x = ctx.result(&node.input("Input"))?;
    if !x.is_valid() {
        return Ok(NodeResult::missing_input("Input"));
    }
    if !x.ty.is_castable() {
        return Ok(non_vector_error(node));
    }

    let v = &x.code;
    let code = match node.node_type.as_str() {
        "Saturate" => format!("saturate( {v} )"),
        "OneMinus" => format!("( 1.0 - {v} )"),
        "Abs" => format!("abs( {v} )"),
        "Sin" => format!("sin( {v} )"),
        "Cos" => format!("cos( {v} )"),
        "Normalize" => format!("normalize( {v} )"),
        other => {
            return Ok(NodeResult::error(format!("{other} is not a unary math node")));
        }
    };
    let ty = numeric_type(&x);
    Ok(if x.constant {
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

    fn float(id: &str, v: f32) -> Node {
        Node::new(id, "Float").with_param("value", json!(v))
    }

    #[test]
    fn add_of_literals_stays_inline() {
        let r = compile_output(
            vec![
                float("a", 1.0),
                float("b", 2.0),
                Node::new("add", "Add")
                    .with_input("A", "a", "Result")
                    .with_input("B", "b", "Result"),
            ],
            "add",
            "Result",
        );
        assert_eq!(r, NodeResult::constant(ResultType::Float, "( 1.0 + 2.0 )"));
    }

    #[test]
    fn binary_promotes_the_narrow_operand() {
        let r = compile_output(
            vec![
                Node::new("n", "WorldNormal"),
                Node::new("mul", "Multiply").with_input("A", "n", "Result"),
            ],
            "mul",
            "Result",
        );
        assert_eq!(r.ty, ResultType::Vector3);
        assert_eq!(r.code, "( l_0 * float3( 1.0, 1.0, 1.0 ) )");
        assert!(!r.constant);
    }

    #[test]
    fn scheme_defaults_fill_unconnected_operands() {
        let r = compile_output(
            vec![Node::new("p", "Power").with_param("defaultB", json!(2))],
            "p",
            "Result",
        );
        assert_eq!(r.code, "pow( 1.0, 2.0 )");
    }

    #[test]
    fn dot_product_is_scalar() {
        let r = compile_output(
            vec![
                Node::new("n", "WorldNormal"),
                Node::new("d", "DotProduct")
                    .with_input("A", "n", "Result")
                    .with_input("B", "n", "Result"),
            ],
            "d",
            "Result",
        );
        assert_eq!(r, NodeResult::new(ResultType::Float, "dot( l_0, l_0 )"));
    }

    #[test]
    fn lerp_uses_the_fraction_param() {
        let r = compile_output(vec![Node::new("l", "Lerp").with_param("fraction", json!(0.25))], "l", "Result");
        assert_eq!(r.code, "lerp( 0.0, 1.0, 0.25 )");
    }

    #[test]
    fn unary_without_input_is_missing_input() {
        let r = compile_output(vec![Node::new("s", "Saturate")], "s", "Result");
        assert_eq!(r.errors, ["Missing input: Input"]);
    }

    #[test]
    fn one_minus_keeps_width() {
        let r = compile_output(
            vec![
                Node::new("c", "VertexColor"),
                Node::new("o", "OneMinus").with_input("Input", "c", "RGBA"),
            ],
            "o",
            "Result",
        );
        assert_eq!(r, NodeResult::new(ResultType::Color, "( 1.0 - l_0 )"));
    }
}
