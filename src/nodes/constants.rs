//! Constant nodes (Float, Float2, Float3, Float4, Color, Bool, Float4x4).
//!
//! An unnamed constant is a plain literal. Naming it turns it into a material
//! parameter the material editor can change.

use crate::compiler::EvalContext;
use crate::error::Result;
use crate::graph::{Node, parse_bool, parse_f32, parse_str, parse_struct, parse_vec};
use crate::resources::Parameter;
use crate::value::{NodeResult, ShaderValue, clean_name};

const IDENTITY4X4: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Read param `key` as the literal kind of `node`'s type.
fn literal_param(node: &Node, key: &str) -> Option<ShaderValue> {
    let p = &node.params;
    Some(match node.node_type.as_str() {
        "Float" => ShaderValue::Float(parse_f32(p, key)?),
        "Float2" => ShaderValue::Float2(parse_vec::<2>(p, key, 0.0)?),
        "Float3" => ShaderValue::Float3(parse_vec::<3>(p, key, 0.0)?),
        "Float4" => ShaderValue::Float4(parse_vec::<4>(p, key, 0.0)?),
        "Color" => ShaderValue::Color(parse_vec::<4>(p, key, 1.0)?),
        "Bool" => ShaderValue::Bool(parse_bool(p, key)?),
        "Float4x4" => ShaderValue::Float4x4(parse_vec::<16>(p, key, 0.0)?),
        _ => return None,
    })
}

fn default_literal(node_type: &str) -> Option<ShaderValue> {
    Some(match node_type {
        "Float" => ShaderValue::Float(0.0),
        "Float2" => ShaderValue::Float2([0.0; 2]),
        "Float3" => ShaderValue::Float3([0.0; 3]),
        "Float4" => ShaderValue::Float4([0.0; 4]),
        "Color" => ShaderValue::Color([1.0; 4]),
        "Bool" => ShaderValue::Bool(false),
        "Float4x4" => ShaderValue::Float4x4(IDENTITY4X4),
        _ => return None,
    })
}

/// Compile a constant node.
///
/// # Parameters
/// - `value`: literal of the node's kind
/// - `name`: parameter name; blank keeps the value a literal
/// - `min`, `max`, `isRange`: slider range of a named parameter
/// - `isAttribute`: expose the parameter as a named attribute
/// - `ui`: `{ type, group, priority, step }` editor hints
///
/// # Output
/// - `Result`: the literal, a preview attribute, or the parameter global
pub fn compile_constant(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let Some(value) = literal_param(node, "value").or_else(|| default_literal(&node.node_type)) else {
        return Ok(NodeResult::error(format!(
            "{} is not a constant node",
            node.node_type
        )));
    };

    let name = parse_str(&node.params, "name").unwrap_or_default();
    if clean_name(name).is_empty() {
        return ctx.result_value(value);
    }

    let parameter = Parameter {
        name: name.to_string(),
        value,
        min: literal_param(node, "min"),
        max: literal_param(node, "max"),
        is_range: parse_bool(&node.params, "isRange").unwrap_or(false),
        is_attribute: parse_bool(&node.params, "isAttribute").unwrap_or(false),
        ui: parse_struct(&node.params, "ui").unwrap_or_default(),
    };
    ctx.result_parameter(parameter)
}
