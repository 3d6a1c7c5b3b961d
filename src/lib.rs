//! Compiles node-forge shader graphs into HLSL material and post-process shaders.
//!
//! ```no_run
//! use node_forge_shadergraph::{CompileOptions, compile, graph::load_graph_from_path};
//!
//! let graph = load_graph_from_path("material.json")?;
//! let shader = compile(&graph, CompileOptions::final_build())?;
//! println!("{}", shader.source);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod compiler;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod resources;
pub mod schema;
pub mod value;

pub use compiler::{
    CompileOptions, Diagnostic, EvalContext, GeneratedShader, GraphCompiler, Severity, Stage, compile,
};
pub use error::{GraphError, Result};
pub use graph::{Node, NodeInput, ShaderGraph};
pub use value::{NodeResult, ResultType, ShaderValue};
