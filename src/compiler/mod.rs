//! Graph compile context.
//!
//! A [`GraphCompiler`] walks a [`ShaderGraph`] depth first, once per shader stage.
//! Node compilers call back into an [`EvalContext`] to resolve their inputs and to
//! register globals; the accumulated per-stage tables are then rendered into a
//! stage template by [`emit`].

mod emit;
mod stage;
mod switch;
mod templates;

pub use stage::{CompileResult, Local, LocalBody, Registry, Stage, SwitchBlock, SwitchScope};
pub use switch::StaticSwitch;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GraphError, Result};
use crate::graph::{Node, NodeInput, ShaderDomain, ShaderGraph};
use crate::nodes;
use crate::resources::{Feature, Gradient, MAX_GRADIENT_KEYS, Parameter, SamplerState, TextureInput, TextureKind};
use crate::value::{NodeResult, ResultMetadata, ResultType, ShaderValue, SwitchBinding, clean_name, promote};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Expose every literal as a runtime attribute and make each local previewable.
    pub preview: bool,
}

impl CompileOptions {
    pub fn preview() -> Self {
        Self { preview: true }
    }

    pub fn final_build() -> Self {
        Self { preview: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A message attached to the node that caused it (or to the graph as a whole).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub node: Option<String>,
    pub message: String,
    pub severity: Severity,
}

/// Called once per runtime attribute a preview compile introduces.
pub type AttributeObserver<'g> = Box<dyn FnMut(&str, &ShaderValue) + 'g>;

/// Output of [`GraphCompiler::generate`].
#[derive(Clone, Debug, Default)]
pub struct GeneratedShader {
    /// Shader source. Empty when a final compile hit errors.
    pub source: String,
    /// Component manifest for post-process graphs.
    pub post_process_component: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// Nodes in preview stage-id order; the node at index `i` has stage id `i + 1`.
    pub compiled_nodes: Vec<String>,
    pub attributes: Vec<(String, ShaderValue)>,
}

impl GeneratedShader {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Stage id the preview renderer uses to isolate `node_id`.
    pub fn stage_id(&self, node_id: &str) -> Option<usize> {
        self.compiled_nodes
            .iter()
            .position(|n| n == node_id)
            .map(|i| i + 1)
    }
}

pub struct GraphCompiler<'g> {
    graph: &'g ShaderGraph,
    nodes: HashMap<&'g str, &'g Node>,
    options: CompileOptions,
    vertex: CompileResult,
    pixel: CompileResult,
    diagnostics: Vec<Diagnostic>,
    reported: HashSet<(Option<String>, String)>,
    compiled_nodes: Vec<String>,
    /// Created features keyed by combo symbol, with the id of the node that created them.
    features: Registry<(String, Feature)>,
    attributes: Registry<ShaderValue>,
    observer: Option<AttributeObserver<'g>>,
}

impl<'g> GraphCompiler<'g> {
    pub fn new(graph: &'g ShaderGraph, options: CompileOptions) -> Self {
        Self {
            graph,
            nodes: graph.nodes_by_id(),
            options,
            vertex: CompileResult::default(),
            pixel: CompileResult::default(),
            diagnostics: Vec::new(),
            reported: HashSet::new(),
            compiled_nodes: Vec::new(),
            features: Registry::default(),
            attributes: Registry::default(),
            observer: None,
        }
    }

    pub fn with_attribute_observer(mut self, observer: impl FnMut(&str, &ShaderValue) + 'g) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn is_preview(&self) -> bool {
        self.options.preview
    }

    pub fn graph(&self) -> &'g ShaderGraph {
        self.graph
    }

    pub fn stage_result(&self, stage: Stage) -> &CompileResult {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Pixel => &self.pixel,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut CompileResult {
        match stage {
            Stage::Vertex => &mut self.vertex,
            Stage::Pixel => &mut self.pixel,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn compiled_nodes(&self) -> &[String] {
        &self.compiled_nodes
    }

    /// Evaluation handle bound to one stage's tables.
    pub fn context(&mut self, stage: Stage) -> EvalContext<'_, 'g> {
        EvalContext {
            compiler: self,
            stage,
            scope: Vec::new(),
            node: None,
            literals: 0,
        }
    }

    pub(crate) fn report(&mut self, node: Option<&str>, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        let key = (node.map(str::to_string), message.clone());
        if !self.reported.insert(key) {
            return;
        }
        match severity {
            Severity::Error => warn!(node = node.unwrap_or("<graph>"), %message, "node error"),
            Severity::Warning => debug!(node = node.unwrap_or("<graph>"), %message, "node warning"),
        }
        self.diagnostics.push(Diagnostic {
            node: node.map(str::to_string),
            message,
            severity,
        });
    }

    fn expose_attribute(&mut self, name: &str, value: &ShaderValue) {
        if !self.attributes.register(name, || value.clone()) {
            return;
        }
        debug!(attribute = name, "preview attribute");
        if let Some(observer) = self.observer.as_mut() {
            observer(name, value);
        }
    }

    /// Walk the graph for both stages and render the shader.
    #[tracing::instrument(skip_all, fields(preview = self.options.preview, nodes = self.graph.nodes.len()))]
    pub fn generate(mut self) -> Result<GeneratedShader> {
        let graph = self.graph;
        let Some(result_node) = graph.result_node() else {
            self.report(None, "Graph has no Result node", Severity::Error);
            return Ok(self.finish(String::new(), None));
        };

        let pixel_assignments = self.material_assignments(result_node, Stage::Pixel)?;

        if self.options.preview {
            let mut ctx = self.context(Stage::Pixel);
            for node in &graph.nodes {
                if node.id == result_node.id {
                    continue;
                }
                let Some(output) = nodes::find_definition(&node.node_type).and_then(|d| d.outputs.first()) else {
                    continue;
                };
                // Already compiled, possibly only inside a switch branch.
                let input = NodeInput::new(node.id.as_str(), *output);
                if ctx.state_ref().is_cached(&input) {
                    continue;
                }
                ctx.result(&input)?;
            }
        }

        let vertex_assignments = self.material_assignments(result_node, Stage::Vertex)?;

        if !self.options.preview && self.has_errors() {
            info!(errors = self.diagnostics.len(), "compile blocked by errors");
            return Ok(self.finish(String::new(), None));
        }

        let source = emit::render_shader(&self, &vertex_assignments, &pixel_assignments)?;
        let component = match graph.domain {
            ShaderDomain::PostProcess => Some(emit::render_post_process_component(&self)?),
            ShaderDomain::Surface => None,
        };
        info!(
            bytes = source.len(),
            vertex_locals = self.vertex.locals.len(),
            pixel_locals = self.pixel.locals.len(),
            "generated shader"
        );
        Ok(self.finish(source, component))
    }

    /// Resolve the Result node inputs belonging to `stage` into assignment statements.
    fn material_assignments(&mut self, result_node: &'g Node, stage: Stage) -> Result<Vec<String>> {
        let domain = self.graph.domain;
        let mut ctx = self.context(stage);
        let mut lines = Vec::new();
        for input in nodes::result::material_inputs(domain) {
            if nodes::result::input_stage(input.name) != stage || !result_node.is_connected(input.name) {
                continue;
            }
            ctx.node = Some(result_node);
            let value = ctx.result(&result_node.input(input.name))?;
            if !value.is_valid() {
                continue;
            }
            let target = input.ty.components();
            if !value.ty.is_castable() {
                ctx.error(format!("{} expects a value with {target} components", input.name));
                continue;
            }
            let expr = value.cast(target, 0.0)?;
            lines.push(nodes::result::assignment(domain, input.name, &expr));
        }
        Ok(lines)
    }

    fn finish(self, source: String, post_process_component: Option<String>) -> GeneratedShader {
        GeneratedShader {
            source,
            post_process_component,
            diagnostics: self.diagnostics,
            compiled_nodes: self.compiled_nodes,
            attributes: self
                .attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

/// Compile a graph in one call.
pub fn compile(graph: &ShaderGraph, options: CompileOptions) -> Result<GeneratedShader> {
    GraphCompiler::new(graph, options).generate()
}

/// The node-authoring API: one stage, one switch scope, one node being compiled.
pub struct EvalContext<'c, 'g> {
    compiler: &'c mut GraphCompiler<'g>,
    stage: Stage,
    scope: SwitchScope,
    node: Option<&'g Node>,
    /// Preview literals introduced so far by the node being evaluated.
    literals: usize,
}

impl<'c, 'g> EvalContext<'c, 'g> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_preview(&self) -> bool {
        self.compiler.options.preview
    }

    pub fn graph(&self) -> &'g ShaderGraph {
        self.compiler.graph
    }

    pub fn domain(&self) -> ShaderDomain {
        self.compiler.graph.domain
    }

    /// Id of the node whose output is being compiled.
    pub fn node_id(&self) -> Option<&'g str> {
        self.node.map(|n| n.id.as_str())
    }

    pub fn scope(&self) -> &[SwitchBinding] {
        &self.scope
    }

    fn state(&mut self) -> &mut CompileResult {
        self.compiler.stage_mut(self.stage)
    }

    fn state_ref(&self) -> &CompileResult {
        self.compiler.stage_result(self.stage)
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let node = self.node_id();
        self.compiler.report(node, message, Severity::Error);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let node = self.node_id();
        self.compiler.report(node, message, Severity::Warning);
    }

    /// Resolve the output an input socket is wired to.
    ///
    /// Unconnected or dangling inputs yield the invalid default. Non-constant results
    /// are promoted to a local `l_<n>` the first time; later requests for the same input
    /// from the same or an enclosed switch scope reuse it without re-running the node.
    pub fn result(&mut self, input: &NodeInput) -> Result<NodeResult> {
        if !input.is_valid() {
            return Ok(NodeResult::default());
        }
        let Some(node) = self.compiler.nodes.get(input.identifier.as_str()).copied() else {
            debug!(%input, "input references a missing node");
            return Ok(NodeResult::default());
        };
        if let Some(hit) = self.state_ref().cached(input, &self.scope) {
            return Ok(hit.clone());
        }
        if self.state_ref().in_progress.contains(input) {
            warn!(%input, "cyclic dependency");
            self.compiler.report(
                Some(&node.id),
                format!("Cyclic dependency detected at {input}"),
                Severity::Error,
            );
            return Ok(NodeResult::default());
        }

        self.state().in_progress.push(input.clone());
        let produced = self.evaluate(node, &input.output);
        self.state().in_progress.pop();
        let produced = produced?;

        if !produced.is_valid() {
            if produced.ty != ResultType::Void {
                if produced.errors.is_empty() && produced.warnings.is_empty() {
                    self.compiler.report(Some(&node.id), "Missing input", Severity::Error);
                }
                for message in &produced.errors {
                    self.compiler.report(Some(&node.id), message.as_str(), Severity::Error);
                }
                for message in &produced.warnings {
                    self.compiler.report(Some(&node.id), message.as_str(), Severity::Warning);
                }
            }
            return Ok(NodeResult::default());
        }
        for message in &produced.warnings {
            self.compiler.report(Some(&node.id), message.as_str(), Severity::Warning);
        }

        let scope = self.scope.clone();
        if produced.ty == ResultType::Gradient || produced.constant {
            self.state().cache(input.clone(), scope, produced.clone());
            return Ok(produced);
        }

        let stage_id = if self.compiler.options.preview && self.stage == Stage::Pixel {
            let compiled = &mut self.compiler.compiled_nodes;
            let index = match compiled.iter().position(|id| *id == node.id) {
                Some(index) => index,
                None => {
                    compiled.push(node.id.clone());
                    compiled.len() - 1
                }
            };
            Some(index + 1)
        } else {
            None
        };

        let state = self.state();
        let name = format!("l_{}", state.next_local);
        state.next_local += 1;

        let local = NodeResult::new(produced.ty, name.clone());
        state.locals.push(Local {
            name,
            scope: scope.clone(),
            stage_id,
            body: LocalBody::Value(produced),
        });
        state.cache(input.clone(), scope, local.clone());
        Ok(local)
    }

    /// Run `node`'s compile function for `output` without caching the result.
    pub fn evaluate(&mut self, node: &'g Node, output: &str) -> Result<NodeResult> {
        let previous = self.node.replace(node);
        let literals = std::mem::take(&mut self.literals);
        let produced = nodes::compile_node(node, output, self);
        self.node = previous;
        self.literals = literals;
        produced
    }

    /// Like [`result`](Self::result), falling back to a literal when nothing usable is wired.
    pub fn result_or(&mut self, input: &NodeInput, default: ShaderValue) -> Result<NodeResult> {
        if input.is_valid() {
            let result = self.result(input)?;
            if result.is_valid() {
                return Ok(result);
            }
        }
        self.result_value(default)
    }

    /// Resolve two operands and widen the narrower one to the other's lane count.
    pub fn result_pair(
        &mut self,
        a: &NodeInput,
        b: &NodeInput,
        default_a: ShaderValue,
        default_b: ShaderValue,
    ) -> Result<(NodeResult, NodeResult)> {
        let a = self.result_or(a, default_a)?;
        let b = self.result_or(b, default_b)?;
        promote(a, b)
    }

    /// A literal: inline text for final compiles, a named runtime attribute for previews.
    pub fn result_value(&mut self, value: ShaderValue) -> Result<NodeResult> {
        match &value {
            ShaderValue::Sampler(sampler) => {
                let name = self.result_sampler(sampler);
                return Ok(NodeResult::constant(ResultType::Sampler, name));
            }
            ShaderValue::Texture(_) => {
                return Err(GraphError::UnsupportedValue(format!("{value:?}")));
            }
            _ => {}
        }

        let ty = value.result_type();
        if !self.compiler.options.preview {
            let code = value.literal()?;
            // Matrices are declared through a constructor, so they must become locals.
            return Ok(if ty.is_matrix() {
                NodeResult::new(ty, code)
            } else {
                NodeResult::constant(ty, code)
            });
        }

        // Names follow the literal's position within its node, so evaluating the
        // node again (another output, another switch branch) rebinds the same attribute.
        let owner = clean_name(self.node_id().unwrap_or("Graph"));
        let name = loop {
            let name = format!("g_{}{owner}_{}", value.prefix(), self.literals);
            self.literals += 1;
            match self.state_ref().attributes.get(&name) {
                Some(existing) if *existing != value => continue,
                _ => break name,
            }
        };
        self.bind_attribute(&name, value);
        Ok(NodeResult::new(ty, name))
    }

    pub(crate) fn bind_attribute(&mut self, name: &str, value: ShaderValue) {
        self.compiler.expose_attribute(name, &value);
        self.state().attributes.register(name, || value);
    }

    /// Register a material parameter and reference its global.
    ///
    /// Parameters are keyed by their prefixed, cleaned name. Registering the same name
    /// again reuses the first declaration; reusing it for another type is an error.
    pub fn result_parameter(&mut self, parameter: Parameter) -> Result<NodeResult> {
        if clean_name(&parameter.name).is_empty() {
            return self.result_value(parameter.value);
        }
        let ty = parameter.value.result_type();
        let var = parameter.variable_name();

        if self.compiler.options.preview {
            self.bind_attribute(&var, parameter.value);
            return Ok(NodeResult::new(ty, var));
        }

        let state = self.state();
        match state.parameters.get(&var) {
            Some(existing) if existing.value.result_type() != ty => {
                return Ok(NodeResult::error(format!(
                    "Parameter name '{}' is already used by a different type",
                    parameter.name
                )));
            }
            Some(_) => {}
            None => {
                state.parameters.register(&var, || parameter);
                debug!(parameter = %var, "registered parameter");
            }
        }
        Ok(NodeResult::constant(ty, var))
    }

    /// Register a sampler and return its global name. Blank names get `g_sSampler<n>`.
    pub fn result_sampler(&mut self, sampler: &SamplerState) -> String {
        let state = self.state();
        let cleaned = clean_name(&sampler.name);
        let var = if cleaned.is_empty() {
            let same = |s: &SamplerState| {
                clean_name(&s.name).is_empty()
                    && s.filter == sampler.filter
                    && s.address_u == sampler.address_u
                    && s.address_v == sampler.address_v
            };
            match state.samplers.find_key(same) {
                Some(existing) => existing.to_string(),
                None => format!("g_sSampler{}", state.samplers.len()),
            }
        } else {
            format!("g_s{cleaned}")
        };
        if state.samplers.register(&var, || sampler.clone()) {
            debug!(sampler = %var, "registered sampler");
        }
        var
    }

    /// Register a texture input and reference its global. Blank names get `g_tTexture<n>`.
    pub fn result_texture(&mut self, input: &TextureInput) -> NodeResult {
        let ty = match input.kind {
            TextureKind::Texture2D => ResultType::Texture2D,
            TextureKind::TextureCube => ResultType::TextureCube,
        };
        let state = self.state();
        let cleaned = clean_name(&input.name);
        let var = if cleaned.is_empty() {
            match state.textures.find_key(|t| clean_name(&t.name).is_empty() && t == input) {
                Some(existing) => existing.to_string(),
                None => format!("g_tTexture{}", state.textures.len()),
            }
        } else {
            let var = format!("g_t{cleaned}");
            if state.textures.get(&var).is_some_and(|existing| existing != input) {
                return NodeResult::error(format!(
                    "Texture name '{}' is already used by another texture",
                    input.name
                ));
            }
            var
        };
        if state.textures.register(&var, || input.clone()) {
            debug!(texture = %var, image = %input.image, "registered texture");
        }
        if self.compiler.options.preview {
            self.compiler
                .expose_attribute(&var, &ShaderValue::Texture(input.image.clone()));
        }
        NodeResult::constant(ty, var)
            .with_metadata(ResultMetadata::ImagePath(input.image.clone()))
    }

    /// Register a helper function by the name in its signature and return a call to it.
    pub fn result_function(&mut self, body: &str, args: &[&str]) -> Result<String> {
        let name = function_name(body).ok_or_else(|| {
            GraphError::FunctionName(body.lines().next().unwrap_or_default().to_string())
        })?;
        if self
            .state()
            .functions
            .register(&name, || body.trim().to_string())
        {
            debug!(function = %name, "registered function");
        }
        Ok(if args.is_empty() {
            format!("{name}()")
        } else {
            format!("{name}( {} )", args.join(", "))
        })
    }

    /// Register a gradient local. Unnamed gradients are named after their node.
    pub fn register_gradient(&mut self, name: &str, gradient: Gradient) -> NodeResult {
        if gradient.colors.len() > MAX_GRADIENT_KEYS {
            return NodeResult::error(format!(
                "Gradient has more than {MAX_GRADIENT_KEYS} color keys"
            ));
        }
        if gradient.alphas.len() > MAX_GRADIENT_KEYS {
            return NodeResult::error(format!(
                "Gradient has more than {MAX_GRADIENT_KEYS} alpha keys"
            ));
        }
        let cleaned = clean_name(name);
        let var = if cleaned.is_empty() {
            format!("Gradient_{}", clean_name(self.node_id().unwrap_or("Graph")))
        } else {
            cleaned
        };
        if self.state().gradients.register(&var, || gradient) {
            debug!(gradient = %var, "registered gradient");
        }
        NodeResult::new(ResultType::Gradient, var)
    }

    pub fn gradient(&self, name: &str) -> Option<&Gradient> {
        self.state_ref().gradients.get(name)
    }

    /// Run `f` with `binding` pushed onto the switch scope.
    pub(crate) fn within<R>(&mut self, binding: SwitchBinding, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scope.push(binding);
        let out = f(self);
        self.scope.pop();
        out
    }
}

/// Name of the first function declared in `body`: the identifier right before `(`.
pub fn function_name(body: &str) -> Option<String> {
    let head = &body[..body.find('(')?];
    let head = head.trim_end();
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)?;
    let name = &head[start..];
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use serde_json::json;

    fn graph(nodes: Vec<Node>) -> ShaderGraph {
        ShaderGraph {
            nodes,
            ..ShaderGraph::default()
        }
    }

    #[test]
    fn function_name_reads_the_signature() {
        assert_eq!(
            function_name("float4 Tint( float4 c, float t )\n{\n\treturn c * t;\n}").as_deref(),
            Some("Tint")
        );
        assert_eq!(function_name("float Noise(float2 uv) { }").as_deref(), Some("Noise"));
        assert_eq!(function_name("no signature here"), None);
        assert_eq!(function_name("( float a )"), None);
    }

    #[test]
    fn dangling_and_unconnected_inputs_resolve_to_invalid() {
        let g = graph(vec![Node::new("a", "Float")]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let mut ctx = compiler.context(Stage::Pixel);
        assert!(!ctx.result(&NodeInput::default()).unwrap().is_valid());
        assert!(!ctx.result(&NodeInput::new("gone", "Result")).unwrap().is_valid());
        assert!(compiler.diagnostics().is_empty());
    }

    #[test]
    fn non_constant_results_become_locals_once() {
        let g = graph(vec![Node::new("t", "Time")]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let mut ctx = compiler.context(Stage::Pixel);
        let input = NodeInput::new("t", "Result");
        let first = ctx.result(&input).unwrap();
        let second = ctx.result(&input).unwrap();
        assert_eq!(first.code, "l_0");
        assert_eq!(second.code, "l_0");
        assert_eq!(compiler.stage_result(Stage::Pixel).locals.len(), 1);
        assert!(compiler.stage_result(Stage::Vertex).locals.is_empty());
    }

    #[test]
    fn constants_are_inlined() {
        let g = graph(vec![Node::new("f", "Float").with_param("value", json!(2.0))]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let mut ctx = compiler.context(Stage::Pixel);
        let r = ctx.result(&NodeInput::new("f", "Result")).unwrap();
        assert!(r.constant);
        assert_eq!(r.code, "2.0");
        assert!(compiler.stage_result(Stage::Pixel).locals.is_empty());
    }

    #[test]
    fn stages_do_not_share_locals() {
        let g = graph(vec![Node::new("t", "Time")]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let input = NodeInput::new("t", "Result");
        compiler.context(Stage::Pixel).result(&input).unwrap();
        let v = compiler.context(Stage::Vertex).result(&input).unwrap();
        assert_eq!(v.code, "l_0");
        assert_eq!(compiler.stage_result(Stage::Vertex).locals.len(), 1);
        assert_eq!(compiler.stage_result(Stage::Pixel).locals.len(), 1);
    }

    #[test]
    fn cycles_are_reported_instead_of_recursing() {
        let g = graph(vec![
            Node::new("a", "Add").with_input("A", "b", "Result"),
            Node::new("b", "Add").with_input("A", "a", "Result"),
        ]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        compiler
            .context(Stage::Pixel)
            .result(&NodeInput::new("a", "Result"))
            .unwrap();
        assert!(compiler.has_errors());
        assert!(compiler.diagnostics()[0].message.contains("Cyclic dependency"));
    }

    #[test]
    fn unknown_node_types_are_node_errors() {
        let g = graph(vec![Node::new("x", "Teleport")]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let r = compiler
            .context(Stage::Pixel)
            .result(&NodeInput::new("x", "Result"))
            .unwrap();
        assert!(!r.is_valid());
        assert_eq!(compiler.diagnostics()[0].node.as_deref(), Some("x"));
        assert!(compiler.diagnostics()[0].message.contains("Teleport"));
    }

    #[test]
    fn registrations_are_idempotent() {
        let g = graph(vec![]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let mut ctx = compiler.context(Stage::Pixel);

        let sampler = SamplerState::default();
        assert_eq!(ctx.result_sampler(&sampler), "g_sSampler0");
        assert_eq!(ctx.result_sampler(&sampler), "g_sSampler0");

        let texture = TextureInput {
            name: "Albedo Map".into(),
            ..TextureInput::default()
        };
        assert_eq!(ctx.result_texture(&texture).code, "g_tAlbedoMap");
        assert_eq!(ctx.result_texture(&texture).code, "g_tAlbedoMap");

        let body = "float Half( float x ) { return x * 0.5; }";
        assert_eq!(ctx.result_function(body, &["a"]).unwrap(), "Half( a )");
        assert_eq!(ctx.result_function(body, &["b"]).unwrap(), "Half( b )");

        let p = Parameter::new("Roughness", ShaderValue::Float(0.5));
        assert_eq!(ctx.result_parameter(p.clone()).unwrap().code, "g_flRoughness");
        assert_eq!(ctx.result_parameter(p).unwrap().code, "g_flRoughness");

        let gradient = Gradient::default();
        assert_eq!(ctx.register_gradient("Ramp", gradient.clone()).code, "Ramp");
        assert_eq!(ctx.register_gradient("Ramp", gradient).code, "Ramp");

        let state = compiler.stage_result(Stage::Pixel);
        assert_eq!(state.samplers.len(), 1);
        assert_eq!(state.textures.len(), 1);
        assert_eq!(state.functions.len(), 1);
        assert_eq!(state.parameters.len(), 1);
        assert_eq!(state.gradients.len(), 1);
    }

    #[test]
    fn conflicting_registrations_are_errors() {
        let g = graph(vec![]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let mut ctx = compiler.context(Stage::Pixel);

        ctx.result_parameter(Parameter::new("Tint", ShaderValue::Float(1.0)))
            .unwrap();
        let clash = ctx
            .result_parameter(Parameter::new("Tint", ShaderValue::Bool(true)))
            .unwrap();
        // Different prefixes give different globals, so bool and float may share a label.
        assert!(clash.is_valid());
        let clash = ctx
            .result_parameter(Parameter::new("Tint", ShaderValue::Float3([1.0; 3])))
            .unwrap();
        assert!(clash.is_valid());
        let clash = ctx
            .result_parameter(Parameter::new("Tint", ShaderValue::Color([1.0; 4])))
            .unwrap();
        assert!(!clash.is_valid());

        let a = TextureInput {
            name: "Mask".into(),
            image: "a.png".into(),
            ..TextureInput::default()
        };
        let b = TextureInput {
            image: "b.png".into(),
            ..a.clone()
        };
        assert!(ctx.result_texture(&a).is_valid());
        assert!(!ctx.result_texture(&b).is_valid());

        let too_many = Gradient {
            colors: vec![
                crate::resources::GradientColorKey { color: [0.0; 4], time: 0.0 };
                MAX_GRADIENT_KEYS + 1
            ],
            ..Gradient::default()
        };
        assert!(!ctx.register_gradient("Big", too_many).is_valid());
    }

    #[test]
    fn preview_values_are_named_attributes() {
        let g = graph(vec![]);
        let mut seen = Vec::new();
        {
            let mut compiler = GraphCompiler::new(&g, CompileOptions::preview())
                .with_attribute_observer(|name, _| seen.push(name.to_string()));
            let mut ctx = compiler.context(Stage::Pixel);
            let r = ctx.result_value(ShaderValue::Float(2.5)).unwrap();
            assert_eq!(r.code, "g_flGraph_0");
            assert!(!r.constant);
            let state = compiler.stage_result(Stage::Pixel);
            assert_eq!(state.attributes.get("g_flGraph_0"), Some(&ShaderValue::Float(2.5)));
        }
        assert_eq!(seen, ["g_flGraph_0"]);
    }

    #[test]
    fn texture_literals_are_contract_violations() {
        let g = graph(vec![]);
        let mut compiler = GraphCompiler::new(&g, CompileOptions::final_build());
        let err = compiler
            .context(Stage::Pixel)
            .result_value(ShaderValue::Texture("x.png".into()))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedValue(_)));
    }
}
