use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mesh_deploy::Result;
use mesh_deploy::deploy::{ClusterApply, Deployer, KubectlCluster, MemoryCluster};
use mesh_deploy::render::{self, OutputFormat};
use mesh_deploy::{pipeline, spec};

#[derive(Parser)]
#[command(name = "mesh-deploy")]
#[command(about = "Dependency-ordered deployment of service-mesh units", long_about = None)]
struct Cli {
    /// Log level; overrides the plan file. RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: pretty or json.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a plan and print the order units would be submitted in.
    Plan {
        #[arg(long)]
        plan: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Apply every unit in dependency order and report the outcome.
    Deploy {
        #[arg(long)]
        plan: PathBuf,

        /// Apply against an in-memory cluster instead of kubectl/helm.
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        kube_context: Option<String>,

        #[arg(long, default_value = "kubectl")]
        kubectl: PathBuf,

        #[arg(long, default_value = "helm")]
        helm: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Plan { plan, format, out } => {
            // 1) Parse + validate the plan file, then start logging as configured.
            let validated = load_plan(&plan)?;
            validated
                .logging
                .clone()
                .with_overrides(cli.log_level, cli.log_format)
                .init();

            // 2) Load, group and validate the graph.
            let graph = pipeline::build_graph(&validated)?;

            // 3) Render.
            let rendered = render::render_plan(&render::plan_view(&graph), format)?;
            emit(&rendered, out.as_deref())?;
        }
        Commands::Deploy {
            plan,
            dry_run,
            kube_context,
            kubectl,
            helm,
            format,
            out,
        } => {
            let validated = load_plan(&plan)?;
            validated
                .logging
                .clone()
                .with_overrides(cli.log_level, cli.log_format)
                .init();

            let graph = pipeline::build_graph(&validated)?;

            let mut cluster: Box<dyn ClusterApply> = if dry_run {
                Box::new(MemoryCluster::new())
            } else {
                Box::new(KubectlCluster::new(kubectl, helm).with_context(kube_context))
            };

            let report = Deployer::new(validated.failure_policy).submit(graph, cluster.as_mut());
            emit(&render::render_report(&report, format)?, out.as_deref())?;

            if !report.is_success() {
                anyhow::bail!(
                    "deployment {}: failed [{}], skipped [{}]",
                    report.state,
                    report.failed().join(", "),
                    report.skipped().join(", ")
                );
            }
        }
    }

    Ok(())
}

fn load_plan(path: &Path) -> Result<spec::ValidatedPlan> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    spec::PlanSpec::from_path(path)?.validate_and_build(base_dir)
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
