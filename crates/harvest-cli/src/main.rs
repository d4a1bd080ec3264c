use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use harvest_core::{BatchEvent, BatchOptions, GrobidClient, config_file, discover_pdfs, run_batch};
use harvest_reporting::{ChartOptions, ReportOptions, WordCloudOptions, load_font, write_reports};
use tokio_util::sync::CancellationToken;

mod output;
mod settings;

use output::ColorMode;
use settings::{RunArgs, Settings};

/// GROBID Harvest - Pull abstracts, figure counts and links out of a folder of PDFs
#[derive(Parser, Debug)]
#[command(name = "grobid-harvest", version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send every PDF in a directory through GROBID and write the reports
    Run(RunArgs),

    /// Check that the GROBID service is up
    Ping {
        /// GROBID full-text endpoint
        #[arg(long, env = "GROBID_URL")]
        grobid_url: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_file::load_config();

    match cli.command {
        Command::Run(args) => {
            let color = ColorMode(!args.no_color);
            let settings = Settings::resolve(&args, &config);
            run(settings, color, args.skip_health_check).await
        }
        Command::Ping { grobid_url } => ping(settings::resolve_url(grobid_url, &config)).await,
    }
}

async fn ensure_alive(client: &GrobidClient) -> anyhow::Result<()> {
    match client.is_alive().await {
        Ok(true) => Ok(()),
        Ok(false) => anyhow::bail!(
            "GROBID health check at {} failed. Pass --skip-health-check to run anyway",
            client.health_url()
        ),
        Err(e) => anyhow::bail!(
            "Cannot reach GROBID at {}: {}. Start the service or pass --skip-health-check",
            client.health_url(),
            e
        ),
    }
}

async fn ping(grobid_url: String) -> anyhow::Result<()> {
    use owo_colors::OwoColorize;

    let client = GrobidClient::new(grobid_url);
    ensure_alive(&client).await?;
    println!("{} {}", "GROBID is alive:".green(), client.health_url());
    Ok(())
}

/// List the PDFs to send and make sure GROBID can take them. An empty input
/// directory never contacts the service.
async fn prepare_inputs(
    settings: &Settings,
    client: &GrobidClient,
    skip_health_check: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    if !settings.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", settings.input_dir.display());
    }
    let pdfs = discover_pdfs(&settings.input_dir)?;
    if pdfs.is_empty() {
        tracing::info!(dir = %settings.input_dir.display(), "no PDFs found");
    } else if !skip_health_check {
        ensure_alive(client).await?;
    }
    Ok(pdfs)
}

async fn run(settings: Settings, color: ColorMode, skip_health_check: bool) -> anyhow::Result<()> {
    tracing::debug!(?settings, "resolved settings");

    let client = GrobidClient::new(settings.grobid_url.clone()).with_timeout(settings.timeout);
    let pdfs = prepare_inputs(&settings, &client, skip_health_check).await?;

    // A bad configured font should fail before any PDF is uploaded.
    let font = load_font(settings.font.as_deref())?;

    let mut stdout = std::io::stdout();
    output::print_run_header(&mut stdout, &settings, pdfs.len(), color)?;

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let bar = output::progress_bar(pdfs.len() as u64);
    let progress = {
        let bar = bar.clone();
        move |event: BatchEvent| output::show_event(&bar, &event, color)
    };
    let options = BatchOptions {
        concurrency: settings.concurrency,
        tei_dir: settings.tei_dir.clone(),
    };
    let result = run_batch(&client, &pdfs, &options, progress, cancel).await;
    bar.finish_and_clear();
    let outcome = result?;

    let report_options = ReportOptions {
        word_cloud: WordCloudOptions {
            max_words: settings.max_words,
            seed: settings.seed,
            ..WordCloudOptions::default()
        },
        chart: ChartOptions::default(),
    };
    let paths = write_reports(
        &settings.output_dir,
        &outcome.accumulator,
        &report_options,
        font.as_ref(),
    )?;

    writeln!(stdout)?;
    output::print_summary(&mut stdout, &outcome, &paths, color)?;
    Ok(())
}
