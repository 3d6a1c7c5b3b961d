//! Static switch nodes.

use crate::compiler::{EvalContext, StaticSwitch};
use crate::error::Result;
use crate::graph::{Node, parse_str, parse_struct, parse_u32};
use crate::resources::Feature;
use crate::value::{NodeResult, clean_name};

fn option(node: &Node) -> u32 {
    parse_u32(&node.params, "option").unwrap_or(1)
}

/// Compile a StaticSwitch node, which creates the feature it switches on.
///
/// # Parameters
/// - `feature`: `{ name, description, header, options }`
/// - `option`: feature value that selects `True`
///
/// # Inputs
/// - `True`, `False`: the two branches
pub fn compile_static_switch(node: &Node, _output: &str, ctx: &mut EvalContext<'_, '_>) -> Result<NodeResult> {
    let feature: Feature = parse_struct(&node.params, "feature").unwrap_or_default();
    let on_true = node.input("True");
    let on_false = node.input("False");
    ctx.static_switch(StaticSwitch {
        feature: &feature,
        owner: &node.id,
        option: option(node),
        on_true: &on_true,
        on_false: &on_false,
        reference: false,
    })
}

/// Compile a StaticSwitchReference node: a switch on a feature some StaticSwitch
/// node in the graph creates.
///
/// # Parameters
/// - `feature`: name of the referenced feature, `"None"` when unset
/// - `option`: feature value that selects `True`
pub fn compile_static_switch_reference(
    node: &Node,
    _output: &str,
    ctx: &mut EvalContext<'_, '_>,
) -> Result<NodeResult> {
    let name = parse_str(&node.params, "feature").unwrap_or_default();
    if name.trim().is_empty() || name == "None" {
        return Ok(NodeResult::error("Choose a feature to reference"));
    }
    let wanted = clean_name(name);

    let graph = ctx.graph();
    let creator = graph
        .nodes
        .iter()
        .filter(|n| n.node_type == "StaticSwitch")
        .find_map(|n| {
            let feature: Feature = parse_struct(&n.params, "feature")?;
            (clean_name(&feature.name) == wanted).then_some((n, feature))
        });
    let Some((creator, feature)) = creator else {
        return Ok(NodeResult::error(format!(
            "No StaticSwitch node creates feature '{name}'"
        )));
    };

    let on_true = node.input("True");
    let on_false = node.input("False");
    ctx.static_switch(StaticSwitch {
        feature: &feature,
        owner: &creator.id,
        option: option(node),
        on_true: &on_true,
        on_false: &on_false,
        reference: true,
    })
}
