use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use node_forge_shadergraph::{CompileOptions, GraphCompiler, Severity, graph::load_graph_from_path};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shadergraph", version)]
struct Cli {
    /// Input shader graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Emit the live-preview variant (runtime attributes, per-node stage ids).
    #[arg(long)]
    preview: bool,

    /// Output shader path. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Where to write the post-process component manifest, if the graph has one.
    #[arg(long)]
    component_out: Option<PathBuf>,

    /// Print every preview attribute as it is introduced.
    #[arg(long)]
    dump_attributes: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let graph = load_graph_from_path(&cli.graph)?;
    let options = CompileOptions { preview: cli.preview };

    let mut compiler = GraphCompiler::new(&graph, options);
    if cli.dump_attributes {
        compiler = compiler.with_attribute_observer(|name, value| eprintln!("attribute {name} = {value:?}"));
    }
    let shader = compiler
        .generate()
        .with_context(|| format!("compiling {}", cli.graph.display()))?;

    for d in &shader.diagnostics {
        let level = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{level}: [{}] {}", d.node.as_deref().unwrap_or("graph"), d.message);
    }
    if shader.source.is_empty() {
        bail!("{} has errors, no shader emitted", cli.graph.display());
    }

    match &cli.out {
        Some(path) => std::fs::write(path, &shader.source)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", shader.source),
    }

    if let (Some(path), Some(component)) = (&cli.component_out, &shader.post_process_component) {
        std::fs::write(path, component).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
