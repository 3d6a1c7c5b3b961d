//! Built-in shader inputs (time, texture coordinates, interpolants).

use crate::compiler::{EvalContext, Stage};
use crate::error::Result;
use crate::graph::{Node, NodeInput, ShaderDomain, parse_vec};
use crate::value::{NodeResult, ResultType, fmt_f32};

fn surface_only(ctx: &EvalContext<'_, '_>, node: &Node) -> Option<NodeResult> {
    (ctx.domain() == ShaderDomain::PostProcess).then(|| {
        NodeResult::error(format!(
            "{} is not available in post-process shaders",
            node.node_type
        ))
    })
}

/// Untiled texture coordinates of the current stage and domain.
pub(crate) fn default_uv(ctx: &EvalContext<'_, '_>) -> &'static str {
    match (ctx.domain(), ctx.stage()) {
        (_, Stage::Vertex) => "v.vTexCoord.xy",
        (ShaderDomain::Surface, Stage::Pixel) => "i.vTextureCoords.xy",
        (ShaderDomain::PostProcess, Stage::Pixel) => "i.vTexCoord.xy",
    }
}

/// `g_flTime`, seconds since the renderer started.
pub fn compile_time(_node: &Node, _output: &str, _ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    Ok(NodeResult::new(ResultType::Float, "g_flTime"))
}

/// Compile a TexCoord node.
///
/// # Parameters
/// - `tiling`: `[x, y]` multiplier, `[1, 1]` leaves the coordinates untouched
///
/// # Output
/// - `Result`: float2 UV of the current stage's vertex or pixel input
pub fn compile_tex_coord(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let uv = default_uv(ctx);
    let tiling = parse_vec::<2>(&node.params, "tiling", 1.0).unwrap_or([1.0, 1.0]);
    let code = if tiling == [1.0, 1.0] {
        uv.to_string()
    } else {
        format!(
            "{uv} * float2( {}, {} )",
            fmt_f32(tiling[0]),
            fmt_f32(tiling[1])
        )
    };
    Ok(NodeResult::new(ResultType::Vector2, code))
}

pub fn compile_world_position(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if let Some(err) = surface_only(ctx, node) {
        return Ok(err);
    }
    let code = match ctx.stage() {
        Stage::Vertex => "i.vPositionWs",
        Stage::Pixel => "( i.vPositionWithOffsetWs.xyz + g_vHighPrecisionLightingOffsetWs.xyz )",
    };
    Ok(NodeResult::new(ResultType::Vector3, code))
}

pub fn compile_world_normal(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if let Some(err) = surface_only(ctx, node) {
        return Ok(err);
    }
    Ok(NodeResult::new(ResultType::Vector3, "i.vNormalWs"))
}

/// Compile a VertexColor node.
///
/// # Output
/// - `RGBA`: the interpolated vertex colour
/// - `RGB`, `A`: swizzles of `RGBA`, which is resolved once and shared
pub fn compile_vertex_color(node: &Node, output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if let Some(err) = surface_only(ctx, node) {
        return Ok(err);
    }
    let (ty, swizzle) = match output {
        "RGBA" => return Ok(NodeResult::new(ResultType::Color, "i.vColor")),
        "RGB" => (ResultType::Vector3, "rgb"),
        _ => (ResultType::Float, "a"),
    };
    let rgba = ctx.result(&NodeInput::new(node.id.as_str(), "RGBA"))?;
    if !rgba.is_valid() {
        return Ok(NodeResult::default());
    }
    Ok(NodeResult::new(ty, format!("{}.{swizzle}", rgba.code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOptions;
    use crate::nodes::test_utils::{compile_output, compile_output_with};
    use serde_json::json;

    #[test]
    fn tex_coord_depends_on_stage() {
        let node = Node::new("uv", "TexCoord");
        assert_eq!(
            compile_output(vec![node.clone()], "uv", "Result").code,
            "i.vTextureCoords.xy"
        );
        let r = compile_output_with(
            vec![node],
            "uv",
            "Result",
            CompileOptions::final_build(),
            Stage::Vertex,
        );
        assert_eq!(r.code, "v.vTexCoord.xy");
    }

    #[test]
    fn tex_coord_applies_tiling() {
        let node = Node::new("uv", "TexCoord").with_param("tiling", json!([2, 0.5]));
        assert_eq!(
            compile_output(vec![node], "uv", "Result").code,
            "i.vTextureCoords.xy * float2( 2.0, 0.5 )"
        );
    }

    #[test]
    fn vertex_color_channels_share_one_local() {
        let r = compile_output(vec![Node::new("vc", "VertexColor")], "vc", "A");
        assert_eq!(r, NodeResult::new(ResultType::Float, "l_0.a"));
    }
}
