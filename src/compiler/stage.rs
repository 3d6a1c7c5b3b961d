//! Per-stage accumulation tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::NodeInput;
use crate::resources::{Feature, Gradient, Parameter, SamplerState, TextureInput};
use crate::value::{NodeResult, ResultType, ShaderValue, SwitchBinding};

/// Shader stage. Each stage owns a fully independent [`CompileResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Vertex,
    Pixel,
}

/// Chain of switch branches enclosing the current evaluation, outermost first.
pub type SwitchScope = Vec<SwitchBinding>;

/// Insertion-ordered, string-keyed table. Registration is idempotent per key.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    /// Insert `make()` under `key` unless present. Returns whether it was inserted.
    pub fn register(&mut self, key: &str, make: impl FnOnce() -> T) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push((key.to_string(), make()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn find_key(&self, mut pred: impl FnMut(&T) -> bool) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| pred(v))
            .map(|(k, _)| k.as_str())
    }
}

/// A generated local variable, or a switch block assigning one.
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub scope: SwitchScope,
    /// Preview stage id; `Some` only for pixel locals of preview compiles.
    pub stage_id: Option<usize>,
    pub body: LocalBody,
}

#[derive(Debug, Clone)]
pub enum LocalBody {
    Value(NodeResult),
    Switch(SwitchBlock),
}

#[derive(Debug, Clone)]
pub struct SwitchBlock {
    pub ty: ResultType,
    /// `S_FOO == 1` for final compiles, a bool attribute for preview compiles.
    pub condition: String,
    pub runtime: bool,
    pub true_scope: SwitchScope,
    pub true_code: String,
    pub false_scope: SwitchScope,
    pub false_code: String,
}

/// Everything one stage accumulates while the graph is walked.
#[derive(Debug, Default)]
pub struct CompileResult {
    pub locals: Vec<Local>,
    pub(crate) next_local: usize,
    /// Cached result per input, one entry per scope it was produced in.
    pub(crate) input_results: HashMap<NodeInput, Vec<(SwitchScope, NodeResult)>>,
    /// Inputs on the current evaluation path; a repeat means a cycle.
    pub(crate) in_progress: Vec<NodeInput>,
    pub samplers: Registry<SamplerState>,
    pub textures: Registry<TextureInput>,
    pub parameters: Registry<Parameter>,
    /// Named runtime attributes of preview compiles.
    pub attributes: Registry<ShaderValue>,
    pub functions: Registry<String>,
    pub gradients: Registry<Gradient>,
    pub combos: Registry<Feature>,
    pub(crate) switch_names: Registry<()>,
}

impl CompileResult {
    /// Cached result for `input` visible from `scope`, preferring the innermost match.
    pub(crate) fn cached(&self, input: &NodeInput, scope: &[SwitchBinding]) -> Option<&NodeResult> {
        self.input_results
            .get(input)?
            .iter()
            .filter(|(s, _)| scope.starts_with(s))
            .max_by_key(|(s, _)| s.len())
            .map(|(_, r)| r)
    }

    /// Whether `input` was resolved in any scope of this stage.
    pub(crate) fn is_cached(&self, input: &NodeInput) -> bool {
        self.input_results.contains_key(input)
    }

    pub(crate) fn cache(&mut self, input: NodeInput, scope: SwitchScope, result: NodeResult) {
        self.input_results.entry(input).or_default().push((scope, result));
    }

    pub(crate) fn locals_in<'a>(&'a self, scope: &'a [SwitchBinding]) -> impl Iterator<Item = &'a Local> + 'a {
        self.locals.iter().filter(move |l| l.scope.as_slice() == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SwitchBranch;

    #[test]
    fn registry_keeps_first_registration() {
        let mut r: Registry<i32> = Registry::default();
        assert!(r.register("a", || 1));
        assert!(!r.register("a", || 2));
        assert!(r.register("b", || 3));
        assert_eq!(r.get("a"), Some(&1));
        assert_eq!(r.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn cache_lookup_sees_enclosing_scopes_only() {
        let mut state = CompileResult::default();
        let input = NodeInput::new("n", "Result");
        let on = SwitchBinding::new("S_A", SwitchBranch::True);
        let off = SwitchBinding::new("S_A", SwitchBranch::False);

        state.cache(input.clone(), vec![on.clone()], NodeResult::new(ResultType::Float, "l_0"));
        assert!(state.cached(&input, &[]).is_none());
        assert!(state.cached(&input, &[off.clone()]).is_none());
        assert_eq!(state.cached(&input, &[on.clone()]).unwrap().code, "l_0");

        state.cache(input.clone(), vec![], NodeResult::new(ResultType::Float, "l_1"));
        assert_eq!(state.cached(&input, &[off]).unwrap().code, "l_1");
        assert_eq!(state.cached(&input, &[on]).unwrap().code, "l_0");
    }
}
