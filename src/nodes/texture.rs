//! Sampler and texture nodes.

use super::shader_inputs::default_uv;
use crate::compiler::{EvalContext, Stage};
use crate::error::Result;
use crate::graph::{Node, NodeInput, parse_struct};
use crate::resources::{SamplerState, TextureInput};
use crate::value::{NodeResult, ResultMetadata, ResultType, ShaderValue};

/// A sampler state global. Param `sampler`: `{ name, filter, address_u, address_v }`.
pub fn compile_sampler(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let sampler: SamplerState = parse_struct(&node.params, "sampler").unwrap_or_default();
    ctx.result_value(ShaderValue::Sampler(sampler))
}

/// A texture input global. Param `texture` holds the [`TextureInput`] settings.
pub fn compile_texture_object(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let input: TextureInput = parse_struct(&node.params, "texture").unwrap_or_default();
    Ok(ctx.result_texture(&input))
}

/// Compile a TextureSample node.
///
/// # Inputs
/// - `Coords`: UV, defaults to the stage's texture coordinates
/// - `Sampler`: sampler object, defaults to the `sampler` param
/// - `Texture`: texture object, defaults to the `texture` param
///
/// # Output
/// - `RGBA`: the sampled colour
/// - `R`, `G`, `B`, `A`: channels of `RGBA`
///
/// # Example
/// ```hlsl
/// g_tAlbedo.Sample( g_sSampler0, i.vTextureCoords.xy )
/// ```
pub fn compile_texture_sample(node: &Node, output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    if output != "RGBA" {
        let rgba = ctx.result(&NodeInput::new(node.id.as_str(), "RGBA"))?;
        if !rgba.is_valid() {
            return Ok(NodeResult::default());
        }
        let channel = output.to_ascii_lowercase();
        return Ok(NodeResult::new(ResultType::Float, format!("{}.{channel}", rgba.code)));
    }

    let texture = if node.is_connected("Texture") {
        let t = ctx.result(&node.input("Texture"))?;
        if !t.is_valid() {
            return Ok(NodeResult::missing_input("Texture"));
        }
        if !matches!(t.ty, ResultType::Texture2D | ResultType::TextureCube) {
            return Ok(NodeResult::error("Texture input must be a texture object"));
        }
        t
    } else {
        let input: TextureInput = parse_struct(&node.params, "texture").unwrap_or_default();
        let t = ctx.result_texture(&input);
        if !t.is_valid() {
            return Ok(t);
        }
        t
    };

    let sampler = if node.is_connected("Sampler") {
        let s = ctx.result(&node.input("Sampler"))?;
        if s.ty != ResultType::Sampler {
            return Ok(NodeResult::error("Sampler input must be a sampler state"));
        }
        s.code
    } else {
        let state: SamplerState = parse_struct(&node.params, "sampler").unwrap_or_default();
        ctx.result_sampler(&state)
    };

    let lanes = if texture.ty == ResultType::TextureCube { 3 } else { 2 };
    let coords = if node.is_connected("Coords") {
        let c = ctx.result(&node.input("Coords"))?;
        if !c.is_valid() {
            return Ok(NodeResult::missing_input("Coords"));
        }
        if !c.ty.is_castable() {
            return Ok(NodeResult::error("Coords input must be a vector"));
        }
        c.cast(lanes, 0.0)?
    } else if lanes == 2 {
        default_uv(ctx).to_string()
    } else {
        "i.vNormalWs".to_string()
    };

    let code = match ctx.stage() {
        Stage::Pixel => format!("{}.Sample( {sampler}, {coords} )", texture.code),
        Stage::Vertex => format!("{}.SampleLevel( {sampler}, {coords}, 0 )", texture.code),
    };
    let mut result = NodeResult::new(ResultType::Color, code);
    if let Some(path) = texture.image_path() {
        result = result.with_metadata(ResultMetadata::ImagePath(path.to_string()));
    }
    Ok(result)
}
