//! Render the per-stage tables into shader source.

use serde::Serialize;

use super::templates::{PLACEHOLDERS, template_for};
use super::{CompileResult, GraphCompiler, LocalBody, Stage};
use crate::error::{GraphError, Result};
use crate::graph::BlendMode;
use crate::resources::Parameter;
use crate::value::{NodeResult, ShaderValue, SwitchBinding, clean_name};

pub(super) fn render_shader(
    compiler: &GraphCompiler<'_>,
    vertex_assignments: &[String],
    pixel_assignments: &[String],
) -> Result<String> {
    let graph = compiler.graph;
    let preview = compiler.options.preview;
    let vertex = &compiler.vertex;
    let pixel = &compiler.pixel;

    let fragments = [
        graph.description.replace('"', "'"),
        render_features(compiler),
        render_defines(graph.blend_mode),
        render_combos(vertex),
        render_globals(vertex, Stage::Vertex, preview)?,
        render_functions(vertex),
        render_locals(vertex, preview)?,
        vertex_assignments.join("\n"),
        render_combos(pixel),
        render_globals(pixel, Stage::Pixel, preview)?,
        render_functions(pixel),
        render_locals(pixel, preview)?,
        pixel_assignments.join("\n"),
    ];
    Ok(fill_template(&template_for(graph), &fragments))
}

/// Substitute `fragments` into the template's placeholders in a single pass.
///
/// Only tokens of the template itself are replaced; substituted text is copied
/// verbatim even if it contains placeholder-like tokens.
pub(super) fn fill_template(template: &str, fragments: &[String; PLACEHOLDERS.len()]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let slot = after.find("}}").and_then(|end| {
            let name = &after[..end];
            PLACEHOLDERS
                .iter()
                .position(|(placeholder, _)| *placeholder == name)
                .map(|i| (i, end))
        });
        match slot {
            Some((i, end)) => {
                out.push_str(&indent(&fragments[i], PLACEHOLDERS[i].1));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn indent(text: &str, depth: usize) -> String {
    let tabs = "\t".repeat(depth);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{tabs}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_features(compiler: &GraphCompiler<'_>) -> String {
    compiler
        .features
        .iter()
        .map(|(_, (_, feature))| feature.declaration())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_defines(blend: BlendMode) -> String {
    match blend {
        BlendMode::Opaque => String::new(),
        BlendMode::Masked => "#define S_ALPHA_TEST 1".to_string(),
        BlendMode::Translucent => "#define S_TRANSLUCENT 1".to_string(),
    }
}

fn render_combos(state: &CompileResult) -> String {
    state
        .combos
        .iter()
        .map(|(_, feature)| feature.static_combo())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_globals(state: &CompileResult, stage: Stage, preview: bool) -> Result<String> {
    let mut lines: Vec<String> = state
        .samplers
        .iter()
        .map(|(var, sampler)| sampler.declaration(var))
        .collect();

    if preview {
        for (var, texture) in state.textures.iter() {
            lines.push(texture.preview_declaration(var));
        }
        for (name, value) in state.attributes.iter() {
            lines.push(attribute_declaration(name, value)?);
        }
        if stage == Stage::Pixel {
            lines.push("int g_iStageId < Attribute( \"StageId\" ); >;".to_string());
        }
    } else {
        for (var, texture) in state.textures.iter() {
            lines.push(texture.declaration(var));
        }
        for (var, parameter) in state.parameters.iter() {
            let ty = parameter.value.result_type().hlsl()?;
            lines.push(format!("{ty} {var} {};", parameter.annotations()));
        }
    }
    Ok(lines.join("\n"))
}

fn attribute_declaration(name: &str, value: &ShaderValue) -> Result<String> {
    let ty = value.result_type().hlsl()?;
    let defaults = value.components()?;
    Ok(format!(
        "{ty} {name} < Attribute( \"{name}\" ); Default{}( {} ); >;",
        defaults.len(),
        value.component_list()?
    ))
}

fn render_functions(state: &CompileResult) -> String {
    state
        .functions
        .iter()
        .map(|(_, body)| body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_locals(state: &CompileResult, preview: bool) -> Result<String> {
    let mut out = String::new();
    for (var, gradient) in state.gradients.iter() {
        out.push_str(&gradient.declaration(var));
    }
    render_scope(state, &[], preview, &mut out)?;
    Ok(out.trim_end().to_string())
}

/// Locals declared exactly in `scope`, with switch blocks recursing into their branches.
fn render_scope(
    state: &CompileResult,
    scope: &[SwitchBinding],
    preview: bool,
    out: &mut String,
) -> Result<()> {
    for local in state.locals_in(scope) {
        match &local.body {
            LocalBody::Value(result) => {
                let ty = result.ty.hlsl()?;
                let code = if result.ty.is_matrix() && !is_identifier(&result.code) {
                    format!("{ty}( {} )", result.code)
                } else {
                    result.code.clone()
                };
                out.push_str(&format!("{ty} {} = {code};\n", local.name));

                if let Some(id) = local.stage_id.filter(|_| preview && result.ty.is_castable()) {
                    let shown = NodeResult::new(result.ty, local.name.as_str()).cast(4, 1.0)?;
                    out.push_str(&format!("if ( g_iStageId == {id} ) return {shown};\n"));
                }
            }
            LocalBody::Switch(block) => {
                let ty = block.ty.hlsl()?;
                out.push_str(&format!("{ty} {};\n", local.name));

                let mut on = String::new();
                render_scope(state, &block.true_scope, preview, &mut on)?;
                on.push_str(&format!("{} = {};\n", local.name, block.true_code));
                let mut off = String::new();
                render_scope(state, &block.false_scope, preview, &mut off)?;
                off.push_str(&format!("{} = {};\n", local.name, block.false_code));

                let (open, middle, close) = if block.runtime {
                    (format!("if ( {} )", block.condition), "else", None)
                } else {
                    (format!("#if ( {} )", block.condition), "#else", Some("#endif"))
                };
                out.push_str(&format!("{open}\n{{\n{}\n}}\n", indent(on.trim_end(), 1)));
                out.push_str(&format!("{middle}\n{{\n{}\n}}\n", indent(off.trim_end(), 1)));
                if let Some(close) = close {
                    out.push_str(close);
                    out.push('\n');
                }
            }
        }
    }
    Ok(())
}

fn is_identifier(code: &str) -> bool {
    !code.is_empty()
        && !code.starts_with(|c: char| c.is_ascii_digit())
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[derive(Serialize)]
struct PostProcessComponent<'a> {
    name: String,
    description: &'a str,
    parameters: Vec<ComponentParameter<'a>>,
}

#[derive(Serialize)]
struct ComponentParameter<'a> {
    name: &'a str,
    attribute: &'a str,
    value: &'a ShaderValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<&'a ShaderValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<&'a ShaderValue>,
}

impl<'a> ComponentParameter<'a> {
    fn new(attribute: &'a str, parameter: &'a Parameter) -> Self {
        Self {
            name: parameter.name.as_str(),
            attribute,
            value: &parameter.value,
            min: parameter.min.as_ref().filter(|_| parameter.is_range),
            max: parameter.max.as_ref().filter(|_| parameter.is_range),
        }
    }
}

/// JSON manifest describing the component that drives a post-process shader.
pub(super) fn render_post_process_component(compiler: &GraphCompiler<'_>) -> Result<String> {
    let graph = compiler.graph;
    let name = match clean_name(&graph.description) {
        n if n.is_empty() => "PostProcess".to_string(),
        n => n,
    };
    let component = PostProcessComponent {
        name,
        description: &graph.description,
        parameters: compiler
            .pixel
            .parameters
            .iter()
            .map(|(var, p)| ComponentParameter::new(var, p))
            .collect(),
    };
    serde_json::to_string_pretty(&component).map_err(|e| GraphError::Serialize {
        what: "post-process component",
        message: e.to_string(),
    })
}
