use blockflow::client::http::API_BASE_ENV;
use blockflow::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeCli {
    Sync,
    Async,
}

impl From<ModeCli> for RunMode {
    fn from(mode: ModeCli) -> Self {
        match mode {
            ModeCli::Sync => RunMode::Sync,
            ModeCli::Async => RunMode::Async,
        }
    }
}

/// Build, check and submit block pipelines
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the registry/run/explain API
    #[arg(long, global = true, env = API_BASE_ENV)]
    api: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log graph edits and requests
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the quick-start pipeline as a draft graph
    Template {
        /// Registry listing (JSON array of block records) used to pin versions
        #[arg(long)]
        registry: Option<String>,
    },
    /// Compile a draft graph into a pipeline spec
    Compile {
        /// Path to the draft graph JSON file
        draft_path: String,
        /// Registry listing (JSON array of block records)
        #[arg(long, conflicts_with = "remote")]
        registry: Option<String>,
        /// Fetch the registry listing from the API instead of a file
        #[arg(long)]
        remote: bool,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, value_enum, default_value = "sync")]
        mode: ModeCli,
        /// Write the spec here instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Report lock and wiring diagnostics for a draft graph
    Check {
        draft_path: String,
        #[arg(long, conflicts_with = "remote")]
        registry: Option<String>,
        #[arg(long)]
        remote: bool,
    },
    /// Submit a spec file as a run
    Run { spec_path: String },
    /// Ask the explain service for a trace of a spec file
    Explain {
        spec_path: String,
        /// Node id whose step should be shown in detail
        #[arg(long)]
        focus: Option<String>,
    },
    /// List recorded runs
    Runs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.api {
        Some(base) => ClientConfig::new(base),
        None => ClientConfig::default(),
    };
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Command::Template { registry } => {
            let registry = load_registry(registry.as_deref(), false, &config).await;
            let draft = DraftGraph::from_graph(&demo_graph(&registry));
            println!("{}", to_pretty(&draft));
        }
        Command::Compile {
            draft_path,
            registry,
            remote,
            name,
            seed,
            mode,
            out,
        } => {
            let graph = load_draft(&draft_path);
            let registry = load_registry(registry.as_deref(), remote, &config).await;

            let mut builder = Compiler::builder().with_seed(seed).with_mode(mode.into());
            if let Some(name) = name {
                builder = builder.with_name(name);
            }
            let compile_start = Instant::now();
            let spec = builder.build().compile(&graph, &registry);
            let compile_duration = compile_start.elapsed();

            let json = spec
                .to_json_pretty()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to render spec: {}", e)));
            match out {
                Some(path) => {
                    fs::write(&path, json).unwrap_or_else(|e| {
                        exit_with_error(&format!("Failed to write spec to '{}': {}", path, e))
                    });
                    println!(
                        "Compiled '{}' ({} nodes, {} edges, {} locked blocks) in {:?} -> {}",
                        spec.pipeline.id,
                        spec.graph.nodes.len(),
                        spec.graph.edges.len(),
                        spec.locked_blocks.len(),
                        compile_duration,
                        path
                    );
                }
                None => println!("{}", json),
            }
        }
        Command::Check {
            draft_path,
            registry,
            remote,
        } => {
            let graph = load_draft(&draft_path);
            let registry = load_registry(registry.as_deref(), remote, &config).await;
            let diagnostics = Compiler::default().diagnose(&graph, &registry);
            if diagnostics.is_empty() {
                println!("No findings.");
            } else {
                for diagnostic in &diagnostics {
                    println!("  - {}", diagnostic);
                }
                println!("\n{} finding(s).", diagnostics.len());
            }
        }
        Command::Run { spec_path } => {
            let spec = load_spec(&spec_path);
            let service = connect(&config);
            let response = service
                .create_run(&spec)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Run failed: {}", e)));
            println!("Run {} [{}]", response.run_id, response.status);
            if let Some(metrics) = response.metrics {
                for (key, value) in metrics {
                    println!("  {}: {}", key, value);
                }
            }
        }
        Command::Explain { spec_path, focus } => {
            let spec = load_spec(&spec_path);
            let service = connect(&config);
            let trace = service
                .explain(&spec)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Explain failed: {}", e)));

            println!("{}", TraceFormatter::format_flow(&trace.steps, focus.as_deref()));
            match focus_step(&trace, focus.as_deref()) {
                Some(step) => println!("\n{}", TraceFormatter::format_step(step)),
                None => println!("\nThe trace has no steps."),
            }
        }
        Command::Runs => {
            let service = connect(&config);
            let runs = service
                .list_runs()
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Listing runs failed: {}", e)));
            if runs.is_empty() {
                println!("No runs recorded.");
            }
            for run in runs {
                println!(
                    "{:<16} {:<10} {:<28} {}",
                    run.run_id,
                    run.status,
                    run.created_at,
                    run.finished_at.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &ClientConfig) -> HttpPipelineService {
    HttpPipelineService::new(config.clone())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to build HTTP client: {}", e)))
}

fn load_draft(path: &str) -> PipelineGraph {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read draft file '{}': {}", path, e)));
    let conversion = DraftGraph::from_json(&json)
        .and_then(IntoGraph::into_graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load draft: {}", e)));
    for (edge, reason) in &conversion.refused {
        eprintln!(
            "Skipped edge {}:{} -> {}:{}: {}",
            edge.source, edge.source_handle, edge.target, edge.target_handle, reason
        );
    }
    conversion.graph
}

fn load_spec(path: &str) -> PipelineSpec {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read spec file '{}': {}", path, e)));
    PipelineSpec::from_json(&json).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

async fn load_registry(path: Option<&str>, remote: bool, config: &ClientConfig) -> RegistryCache {
    let mut registry = RegistryCache::new();
    if remote {
        let service = connect(config);
        if let Err(e) = registry.refresh(&service).await {
            exit_with_error(&e.to_string());
        }
    } else if let Some(path) = path {
        let json = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read registry file '{}': {}", path, e))
        });
        let records: Vec<BlockRecord> = serde_json::from_str(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse registry JSON: {}", e)));
        registry.replace_with(&records);
    }
    registry
}

fn to_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render JSON: {}", e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
