//! Nodes that emit helper functions.

use super::shader_inputs::default_uv;
use crate::compiler::{EvalContext, function_name};
use crate::error::Result;
use crate::graph::{Node, parse_f32, parse_str, parse_struct};
use crate::value::{NodeResult, ResultType, fmt_f32};

/// Compile a CustomFunction node.
///
/// # Parameters
/// - `body`: full HLSL function source; the call uses the name in its signature
/// - `resultType`: kind of the returned value, `Float` by default
///
/// # Inputs
/// Every connected input becomes an argument, in input-name order.
pub fn compile_custom_function(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let body = parse_str(&node.params, "body").unwrap_or_default();
    if body.trim().is_empty() {
        return Ok(NodeResult::error("Custom function has no body"));
    }
    if function_name(body).is_none() {
        return Ok(NodeResult::error("Custom function body has no function signature"));
    }
    let ty: ResultType = parse_struct(&node.params, "resultType").unwrap_or(ResultType::Float);
    if ty.hlsl().is_err() {
        return Ok(NodeResult::error(format!("Custom function cannot return {ty:?}")));
    }

    let mut args = Vec::with_capacity(node.inputs.len());
    for (name, input) in &node.inputs {
        let r = ctx.result(input)?;
        if !r.is_valid() {
            return Ok(NodeResult::missing_input(name));
        }
        args.push(r.code);
    }
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let call = ctx.result_function(body, &args)?;
    Ok(NodeResult::new(ty, call))
}

const NOISE_VALUE: &str = r#"float SimpleNoise_Value( float2 uv )
{
	float2 i = floor( uv );
	float2 f = frac( uv );
	f = f * f * ( 3.0 - 2.0 * f );
	float a = frac( sin( dot( i, float2( 12.9898, 78.233 ) ) ) * 43758.5453 );
	float b = frac( sin( dot( i + float2( 1.0, 0.0 ), float2( 12.9898, 78.233 ) ) ) * 43758.5453 );
	float c = frac( sin( dot( i + float2( 0.0, 1.0 ), float2( 12.9898, 78.233 ) ) ) * 43758.5453 );
	float d = frac( sin( dot( i + float2( 1.0, 1.0 ), float2( 12.9898, 78.233 ) ) ) * 43758.5453 );
	return lerp( lerp( a, b, f.x ), lerp( c, d, f.x ), f.y );
}"#;

const NOISE: &str = r#"float SimpleNoise( float2 uv, float scale )
{
	float t = 0.0;
	for ( int o = 0; o < 3; o++ )
	{
		float freq = pow( 2.0, float( o ) );
		float amp = pow( 0.5, float( 3 - o ) );
		t += SimpleNoise_Value( uv * scale / freq ) * amp;
	}
	return t;
}"#;

/// Compile a SimpleNoise node: three octaves of value noise.
///
/// # Inputs
/// - `Coords`: UV, defaults to the stage's texture coordinates
///
/// # Parameters
/// - `scale`: frequency multiplier, `50` by default
pub fn compile_simple_noise(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let coords = if node.is_connected("Coords") {
        let c = ctx.result(&node.input("Coords"))?;
        if !c.is_valid() {
            return Ok(NodeResult::missing_input("Coords"));
        }
        if !c.ty.is_castable() {
            return Ok(NodeResult::error("Coords input must be a vector"));
        }
        c.cast(2, 0.0)?
    } else {
        default_uv(ctx).to_string()
    };
    let scale = fmt_f32(parse_f32(&node.params, "scale").unwrap_or(50.0));

    ctx.result_function(NOISE_VALUE, &[])?;
    let call = ctx.result_function(NOISE, &[coords.as_str(), scale.as_str()])?;
    Ok(NodeResult::new(ResultType::Float, call))
}
