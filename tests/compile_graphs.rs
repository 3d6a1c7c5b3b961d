use node_forge_shadergraph::compiler::{CompileOptions, GraphCompiler, compile};
use node_forge_shadergraph::graph::{ShaderGraph, load_graph_from_str};
use serde_json::{Value, json};

fn load(value: Value) -> ShaderGraph {
    load_graph_from_str(&value.to_string()).expect("graph json should load")
}

fn link(node: &str, output: &str) -> Value {
    json!({ "identifier": node, "output": output })
}

fn albedo_graph(nodes: Vec<Value>, albedo_from: &str) -> ShaderGraph {
    let mut all = nodes;
    all.push(json!({
        "id": "result",
        "type": "Result",
        "inputs": { "Albedo": link(albedo_from, "Result") }
    }));
    load(json!({ "description": "test material", "nodes": all }))
}

#[test]
fn constant_albedo_is_inlined_in_final_builds() {
    let graph = albedo_graph(
        vec![json!({ "id": "grey", "type": "Float3", "params": { "value": [0.5, 0.5, 0.5] } })],
        "grey",
    );
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();

    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);
    assert!(shader.source.contains("\t\tm.Albedo = float3( 0.5, 0.5, 0.5 );"));
    assert!(shader.source.contains("Description = \"test material\";"));
    assert!(!shader.source.contains("g_v"));
    assert!(!shader.source.contains("{{"));
    assert!(shader.source.contains("return ShadingModelStandard::Shade( i, m );"));
    assert!(shader.post_process_component.is_none());
}

#[test]
fn preview_binds_literals_to_attributes() {
    let graph = load(json!({
        "nodes": [
            { "id": "rough", "type": "Float", "params": { "value": 0.25 } },
            { "id": "result", "type": "Result", "inputs": { "Roughness": link("rough", "Result") } }
        ]
    }));

    let final_build = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(final_build.source.contains("m.Roughness = 0.25;"));
    assert!(final_build.attributes.is_empty());
    assert!(final_build.compiled_nodes.is_empty());

    let preview = compile(&graph, CompileOptions::preview()).unwrap();
    assert!(
        preview
            .source
            .contains("float g_flrough_0 < Attribute( \"g_flrough_0\" ); Default1( 0.25 ); >;")
    );
    assert!(preview.source.contains("int g_iStageId < Attribute( \"StageId\" ); >;"));
    assert!(preview.source.contains("float l_0 = g_flrough_0;"));
    assert!(preview.source.contains("if ( g_iStageId == 1 ) return float4( l_0, l_0, l_0, l_0 );"));
    assert!(preview.source.contains("m.Roughness = l_0;"));
    assert_eq!(preview.compiled_nodes, ["rough"]);
    assert_eq!(preview.stage_id("rough"), Some(1));
    assert_eq!(preview.attributes.len(), 1);
    assert_eq!(preview.attributes[0].0, "g_flrough_0");
}

#[test]
fn shared_inputs_are_compiled_once() {
    let graph = albedo_graph(
        vec![
            json!({ "id": "k", "type": "Float", "params": { "value": 0.75 } }),
            json!({
                "id": "sum",
                "type": "Add",
                "inputs": { "A": link("k", "Result"), "B": link("k", "Result") }
            }),
        ],
        "sum",
    );

    let mut observed = Vec::new();
    let shader = GraphCompiler::new(&graph, CompileOptions::preview())
        .with_attribute_observer(|name, _| observed.push(name.to_string()))
        .generate()
        .unwrap();

    assert_eq!(observed, ["g_flk_0"]);
    assert_eq!(shader.compiled_nodes, ["k", "sum"]);
    assert!(shader.source.contains("float l_1 = ( l_0 + l_0 );"));
    assert_eq!(shader.source.matches("float l_0 =").count(), 1);
}

#[test]
fn identical_unnamed_samplers_share_one_global() {
    let graph = load(json!({
        "nodes": [
            { "id": "a", "type": "TextureSample", "params": { "texture": { "name": "Albedo" } } },
            { "id": "b", "type": "TextureSample", "params": { "texture": { "name": "Albedo" } } },
            {
                "id": "sum",
                "type": "Add",
                "inputs": { "A": link("a", "RGBA"), "B": link("b", "RGBA") }
            },
            { "id": "result", "type": "Result", "inputs": { "Albedo": link("sum", "Result") } }
        ]
    }));
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();

    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);
    assert_eq!(shader.source.matches("SamplerState g_sSampler0").count(), 1);
    assert!(!shader.source.contains("g_sSampler1"));
    assert_eq!(shader.source.matches("g_tAlbedo <").count(), 1);
}

fn switch_graph() -> ShaderGraph {
    albedo_graph(
        vec![
            json!({ "id": "time", "type": "Time" }),
            json!({ "id": "tint", "type": "Float3", "params": { "value": [1.0, 0.5, 0.0] } }),
            json!({
                "id": "pulse",
                "type": "Multiply",
                "inputs": { "A": link("time", "Result"), "B": link("tint", "Result") }
            }),
            json!({ "id": "plain", "type": "Float3", "params": { "value": [0.25, 0.25, 0.25] } }),
            json!({
                "id": "switch",
                "type": "StaticSwitch",
                "params": { "feature": { "name": "Use Pulse", "header": "Effects" } },
                "inputs": { "True": link("pulse", "Result"), "False": link("plain", "Result") }
            }),
        ],
        "switch",
    )
}

#[test]
fn switch_branches_keep_their_locals_inside_the_block() {
    let shader = compile(&switch_graph(), CompileOptions::final_build()).unwrap();
    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);
    let src = &shader.source;

    assert!(src.contains("Feature( F_USEPULSE, 0..1, \"Effects\" );"));
    assert!(src.contains("StaticCombo( S_USEPULSE, F_USEPULSE, Sys( ALL ) );"));
    assert!(src.contains("m.Albedo = sw_UsePulse;"));

    let open = src.find("#if ( S_USEPULSE == 1 )").expect("switch block");
    let time = src.find("float l_0 = g_flTime;").expect("time local");
    let otherwise = src.find("#else").expect("else branch");
    let end = src.find("#endif").expect("end of block");
    assert!(open < time && time < otherwise);
    assert!(src[otherwise..end].contains("sw_UsePulse = float3( 0.25, 0.25, 0.25 );"));
    assert!(!src[otherwise..end].contains("l_0"));
    assert_eq!(src.matches("g_flTime;").count(), 1);
}

#[test]
fn preview_switches_branch_at_runtime() {
    let shader = compile(&switch_graph(), CompileOptions::preview()).unwrap();
    assert!(shader.source.contains("if ( g_bS_USEPULSE )"));
    assert!(!shader.source.contains("#if ( S_USEPULSE"));
    assert!(shader.attributes.iter().any(|(name, _)| name == "g_bS_USEPULSE"));
}

#[test]
fn preview_compiles_branch_nodes_once() {
    let graph = switch_graph();
    let mut observed = Vec::new();
    let shader = GraphCompiler::new(&graph, CompileOptions::preview())
        .with_attribute_observer(|name, _| observed.push(name.to_string()))
        .generate()
        .unwrap();

    assert_eq!(observed, ["g_vtint_0", "g_vplain_0", "g_bS_USEPULSE"]);
    assert_eq!(shader.compiled_nodes, ["time", "tint", "pulse", "plain"]);
    assert_eq!(shader.stage_id("plain"), Some(4));
    assert!(!shader.source.contains("g_vplain_1"));
    assert_eq!(shader.source.matches("= g_vplain_0;").count(), 1);
    assert_eq!(shader.source.matches("= g_flTime;").count(), 1);

    let otherwise = shader.source.find("else").expect("runtime else branch");
    let plain = shader.source.find("float3 l_3 = g_vplain_0;").expect("plain local");
    assert!(otherwise < plain);
}

#[test]
fn final_builds_never_call_the_attribute_observer() {
    let graph = switch_graph();
    let mut observed = Vec::new();
    let shader = GraphCompiler::new(&graph, CompileOptions::final_build())
        .with_attribute_observer(|name, _| observed.push(name.to_string()))
        .generate()
        .unwrap();
    assert!(!shader.source.is_empty());
    assert!(observed.is_empty());
    assert!(shader.attributes.is_empty());
}

#[test]
fn scalar_albedo_expands_to_three_lanes() {
    let graph = albedo_graph(
        vec![json!({ "id": "half", "type": "Float", "params": { "value": 0.5 } })],
        "half",
    );
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);
    assert!(shader.source.contains("m.Albedo = float3( 0.5, 0.5, 0.5 );"));
    assert!(!shader.source.contains("g_fl"));
}

#[test]
fn errors_block_final_emission_only() {
    let graph = albedo_graph(
        vec![
            json!({ "id": "broken", "type": "Bogus" }),
            json!({ "id": "sum", "type": "Add", "inputs": { "A": link("broken", "Result") } }),
        ],
        "sum",
    );

    let final_build = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(final_build.source.is_empty());
    let error = final_build.errors().next().expect("an error");
    assert_eq!(error.node.as_deref(), Some("broken"));
    assert_eq!(error.message, "Unknown node type 'Bogus'");

    let preview = compile(&graph, CompileOptions::preview()).unwrap();
    assert!(preview.has_errors());
    assert!(!preview.source.is_empty());
}

#[test]
fn cycles_are_reported_not_followed() {
    let graph = albedo_graph(
        vec![
            json!({ "id": "a", "type": "Add", "inputs": { "A": link("b", "Result") } }),
            json!({ "id": "b", "type": "Add", "inputs": { "A": link("a", "Result") } }),
        ],
        "a",
    );
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(shader.source.is_empty());
    assert!(
        shader
            .errors()
            .any(|d| d.message.starts_with("Cyclic dependency detected"))
    );
}

#[test]
fn missing_result_node_is_an_error() {
    let graph = load(json!({ "nodes": [{ "id": "k", "type": "Float" }] }));
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(shader.source.is_empty());
    assert_eq!(
        shader.errors().map(|d| d.message.as_str()).collect::<Vec<_>>(),
        ["Graph has no Result node"]
    );
}

#[test]
fn post_process_graphs_emit_a_component_manifest() {
    let graph = load(json!({
        "description": "Warm Grade",
        "domain": "PostProcess",
        "nodes": [
            {
                "id": "tint",
                "type": "Float4",
                "params": { "name": "Tint", "value": [1.0, 0.5, 0.5, 1.0] }
            },
            { "id": "result", "type": "Result", "inputs": { "Color": link("tint", "Result") } }
        ]
    }));
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);
    assert!(shader.source.contains("color = g_vTint;"));
    assert!(shader.source.contains("float4 g_vTint <"));
    assert!(shader.source.contains("g_tColorBuffer"));

    let manifest: Value =
        serde_json::from_str(shader.post_process_component.as_deref().expect("manifest")).unwrap();
    assert_eq!(manifest["name"], "WarmGrade");
    assert_eq!(manifest["parameters"][0]["name"], "Tint");
    assert_eq!(manifest["parameters"][0]["attribute"], "g_vTint");
    assert!(manifest["parameters"][0].get("min").is_none());
}

#[test]
fn vertex_inputs_compile_into_the_vertex_stage() {
    let graph = load(json!({
        "nodes": [
            { "id": "up", "type": "Float3", "params": { "value": [0.0, 0.0, 2.0] } },
            { "id": "time", "type": "Time" },
            { "id": "wobble", "type": "Multiply", "inputs": { "A": link("up", "Result"), "B": link("time", "Result") } },
            { "id": "result", "type": "Result", "inputs": { "PositionOffset": link("wobble", "Result") } }
        ]
    }));
    let shader = compile(&graph, CompileOptions::final_build()).unwrap();
    assert!(!shader.has_errors(), "{:?}", shader.diagnostics);

    let vs = shader.source.find("MainVs").unwrap();
    let ps = shader.source.find("MainPs").unwrap();
    let offset = shader.source.find("i.vPositionWs.xyz += l_1;").expect("offset assignment");
    assert!(vs < offset && offset < ps);
}
