use afcl_graph::compiler::{core::Compiler, loader};
use afcl_graph::io::{bind_inputs, InputDataProviderFile};
use afcl_graph::{CompileError, EnactmentGraph};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Compiles AFCL workflows into enactment graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workflow and print the resulting graph
    Compile {
        /// Path to the workflow YAML file
        #[arg(long, short)]
        file: PathBuf,

        /// Print the full graph as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Compile a workflow and bind an input file to its root nodes
    Bind {
        /// Path to the workflow YAML file
        #[arg(long, short)]
        file: PathBuf,

        /// Path to the JSON input object
        #[arg(long, short)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CompileError>() {
                Some(compile_error) => {
                    error!(code = compile_error.code(), "compilation failed: {:#}", err)
                }
                None => error!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Compile { file, json } => {
            let graph = compile(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&graph)?);
            } else {
                print_summary(&graph);
            }
        }
        Commands::Bind { file, input } => {
            let graph = compile(&file)?;
            let provider = InputDataProviderFile::from_file(&input.to_string_lossy())?;
            let bound = bind_inputs(&graph, &provider)?;
            for (idx, value) in &bound {
                println!("{} = {}", graph.node(*idx).id, value);
            }
            info!(roots = bound.len(), "inputs bound");
        }
    }
    Ok(())
}

fn compile(file: &Path) -> Result<EnactmentGraph> {
    info!("Loading workflow from: {:?}", file);
    let workflow = loader::load_workflow_from_yaml(&file.to_string_lossy())?;
    info!("Loaded workflow: {}", workflow.name);

    let graph = Compiler::new().compile(&workflow)?;
    Ok(graph)
}

fn print_summary(graph: &EnactmentGraph) {
    println!(
        "{} nodes ({} functions, {} data), {} edges",
        graph.node_count(),
        graph.function_nodes().count(),
        graph.data_nodes().count(),
        graph.edge_count()
    );
    for (idx, node) in graph.function_nodes() {
        let inputs: Vec<&str> = graph
            .predecessors(idx)
            .map(|idx| graph.node(idx).id.as_str())
            .collect();
        println!("  {} <- [{}]", node.id, inputs.join(", "));
    }
    for (_, node) in graph.leaves() {
        println!("  output {}", node.id);
    }
}

