//! Static switches: pick one of two subgraphs per compiled shader variant.
//!
//! Each branch is evaluated with its [`SwitchBinding`] pushed onto the context's scope,
//! so the locals it creates are tagged with that scope and rendered only inside its
//! block. Nested switches just push another binding.

use tracing::{debug, warn};

use super::{EvalContext, Local, LocalBody, SwitchBlock};
use crate::error::Result;
use crate::graph::NodeInput;
use crate::resources::Feature;
use crate::value::{NodeResult, ResultType, ShaderValue, SwitchBinding, SwitchBranch, clean_name};

/// One switch evaluation request.
#[derive(Clone, Copy, Debug)]
pub struct StaticSwitch<'a> {
    pub feature: &'a Feature,
    /// Id of the node that creates the feature.
    pub owner: &'a str,
    /// Option value that selects the true branch.
    pub option: u32,
    pub on_true: &'a NodeInput,
    pub on_false: &'a NodeInput,
    /// Referencing a feature created elsewhere rather than creating it.
    pub reference: bool,
}

impl EvalContext<'_, '_> {
    pub fn static_switch(&mut self, switch: StaticSwitch<'_>) -> Result<NodeResult> {
        let feature = switch.feature;
        if !feature.is_valid() {
            return Ok(NodeResult::error("Feature must have a valid name"));
        }
        let combo = feature.combo_symbol();

        match self.compiler.features.get(&combo) {
            Some((owner, _)) if owner != switch.owner => {
                return Ok(NodeResult::error(format!(
                    "Feature '{}' is already created by another node",
                    feature.name
                )));
            }
            Some(_) => {}
            None => {
                self.compiler
                    .features
                    .register(&combo, || (switch.owner.to_string(), feature.clone()));
                debug!(feature = %combo, owner = switch.owner, "registered feature");
            }
        }
        self.state().combos.register(&combo, || feature.clone());

        let on = SwitchBinding::new(combo.clone(), SwitchBranch::True);
        let off = SwitchBinding::new(combo.clone(), SwitchBranch::False);
        let true_scope = [self.scope.clone(), vec![on.clone()]].concat();
        let false_scope = [self.scope.clone(), vec![off.clone()]].concat();

        let when_true = self.within(on, |ctx| ctx.result(switch.on_true))?;
        let when_false = self.within(off, |ctx| ctx.result(switch.on_false))?;

        for branch in [&when_true, &when_false] {
            if branch.is_valid() && !branch.ty.is_castable() {
                return Ok(NodeResult::error(
                    "Static switch branches must be scalars or vectors",
                ));
            }
        }

        let width = [&when_true, &when_false]
            .into_iter()
            .filter(|b| b.is_valid())
            .map(|b| b.components())
            .max()
            .unwrap_or(1);
        let true_code = self.branch_code(&when_true, width, "true")?;
        let false_code = self.branch_code(&when_false, width, "false")?;

        let name = self.switch_variable(feature, switch.reference);
        let (condition, runtime) = if self.is_preview() {
            let attribute = format!("g_b{combo}");
            self.bind_attribute(&attribute, ShaderValue::Bool(switch.option != 0));
            (attribute, true)
        } else {
            (format!("{combo} == {}", switch.option), false)
        };

        let ty = ResultType::from_components(width);
        let scope = self.scope.clone();
        self.state().locals.push(Local {
            name: name.clone(),
            scope,
            stage_id: None,
            body: LocalBody::Switch(SwitchBlock {
                ty,
                condition,
                runtime,
                true_scope,
                true_code,
                false_scope,
                false_code,
            }),
        });
        Ok(NodeResult::constant(ty, name))
    }

    /// Branch expression at the unified width; unusable branches fall back to `1.0`.
    fn branch_code(&mut self, branch: &NodeResult, width: usize, side: &str) -> Result<String> {
        if branch.is_valid() {
            return branch.cast(width, 0.0);
        }
        warn!(node = self.node_id().unwrap_or("<graph>"), side, "static switch branch falls back to 1.0");
        self.warning(format!("Static switch {side} branch has no value, using 1.0"));
        NodeResult::constant(ResultType::Float, "1.0").cast(width, 0.0)
    }

    fn switch_variable(&mut self, feature: &Feature, reference: bool) -> String {
        let base = format!("sw_{}", clean_name(&feature.name));
        let names = &mut self.state().switch_names;
        let mut name = base.clone();
        let mut k = 1;
        while (reference && name == base) || names.contains(&name) {
            name = format!("{base}_{k}");
            k += 1;
        }
        names.register(&name, || ());
        name
    }
}
