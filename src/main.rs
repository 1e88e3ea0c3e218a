use clap::Parser;
use snapmill::config::Cli;
use snapmill::Config;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            // Argument errors are distinct from run failures
            std::process::exit(2);
        }
    };

    init_logging(&config);

    let report = snapmill::commands::run::run(&config)?;

    println!("snapmill v{}", snapmill::VERSION);
    println!("Published snapshot {}", report.path.display());
    match &report.previous {
        Some(previous) => println!("  Diffed against {}", previous.display()),
        None => println!("  No previous snapshot: full copy"),
    }
    println!(
        "  {} linked, {} copied ({} bytes), {} dirs, {} symlinks, {} skipped",
        report.stats.files_linked,
        report.stats.files_copied,
        report.stats.bytes_copied,
        report.stats.dirs_created,
        report.stats.symlinks_created,
        report.stats.skipped,
    );

    Ok(())
}

fn init_logging(config: &Config) {
    let default = if config.quiet {
        "snapmill=error"
    } else {
        match config.verbose {
            0 => "snapmill=info",
            1 => "snapmill=debug",
            _ => "snapmill=trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
