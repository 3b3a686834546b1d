use anyhow::Context;
use clap::Parser;
use hostwatch_core::sample::{sample_registry, sample_report_config};
use hostwatch_core::{
    Config, ConfigLoader, HostAllowList, PathRegistry, ReportGenerator, RequestObserver,
    ShutdownCoordinator, ShutdownOutcome,
};
use hostwatch_proxy::ProxyServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(about = "HTTP proxy that records which hosts and paths were contacted")]
#[command(version)]
struct Args {
    /// Config file path (default: $HOSTWATCH_CONFIG or ./hostwatch.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Proxy listen address, overrides [proxy] listen
    #[arg(long, short = 'l')]
    listen: Option<String>,

    /// JSON dump written on shutdown
    #[arg(long, value_name = "PATH")]
    dump_file: Option<PathBuf>,

    /// HTML report written on shutdown
    #[arg(long, value_name = "PATH")]
    report_file: Option<PathBuf>,

    /// HTML template used for the report
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Write a report from built-in sample traffic and exit
    #[arg(long)]
    sample: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.proxy.listen = listen.clone();
        }
        if let Some(path) = &self.dump_file {
            config.report.dump_file = path.clone();
        }
        if let Some(path) = &self.report_file {
            config.report.report_file = path.clone();
        }
        if let Some(path) = &self.template {
            config.report.template = path.clone();
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    // Load configuration
    let mut config = ConfigLoader::load(args.config.clone()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);

    let allow_list = Arc::new(HostAllowList::from_validated(&config));
    tracing::info!("Loaded configuration with {} allowed hosts", allow_list.len());
    for host in allow_list.iter() {
        tracing::debug!("Allowed host: {}", host);
    }

    if args.sample {
        return write_sample(allow_list, config.report.template);
    }

    let registry = Arc::new(PathRegistry::new());
    let observer = RequestObserver::new(Arc::clone(&allow_list), Arc::clone(&registry));
    let coordinator = Arc::new(ShutdownCoordinator::new(
        registry,
        allow_list,
        ReportGenerator::new(config.report.clone()),
    ));

    let server = ProxyServer::bind(&config.proxy.listen, Arc::new(observer))
        .await
        .context("Failed to start proxy server")?;

    let signal_task = tokio::spawn(Arc::clone(&coordinator).run_until_signal());

    server.run(coordinator.token()).await?;

    let outcome = match signal_task.await? {
        Some(outcome) => outcome,
        // Only reachable if something else drove the shutdown
        None => {
            tracing::warn!("Shutdown handled elsewhere");
            return Ok(());
        }
    };

    if let ShutdownOutcome::DumpFailed(e) = &outcome {
        eprintln!("Failed to dump sites data: {}", e);
    }
    std::process::exit(outcome.exit_code())
}

/// Generate the sample dump and report, then exit
fn write_sample(allow_list: Arc<HostAllowList>, template: PathBuf) -> anyhow::Result<()> {
    let registry = sample_registry(Arc::clone(&allow_list));
    let generator = ReportGenerator::new(sample_report_config(template));

    let artifacts = generator
        .generate(&registry.snapshot(), &allow_list)
        .context("Failed to generate sample report")?;

    println!("Sample files generated successfully");
    println!("JSON: {}", artifacts.dump_file.display());
    println!("HTML: {}", artifacts.report_file.display());
    Ok(())
}
