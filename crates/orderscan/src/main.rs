//! `orderscan`: purchase-order PDF analysis
//!
//! ```text
//! orderscan batch [--input DIR] [--output DIR] [--summary-only] [--on-failure embed|mark|skip] [--strict]
//! orderscan serve [--host H] [--port P]
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use orderscan_adaptor_web::{WebUiConfig, WebUiServer};
use orderscan_core::{
    init_logging, init_logging_with, load_env, AppConfig, BatchOptions, BatchReport, BatchRunner,
    DocumentPipeline, FailurePolicy, LanguageModel, API_KEY_VAR,
};
use orderscan_provider_openai::{print_settings, OpenAIModel};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Exit status when `--strict` is set and a file failed
const EXIT_FILES_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "orderscan", author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `orderscan_core=debug` (default: RUST_LOG, ORDERSCAN_LOG_LEVEL, info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize every PDF in the input directory into the output directory
    Batch(BatchArgs),
    /// Start the interactive web UI
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory scanned for *.pdf files (created if missing)
    #[arg(long, env = "ORDERSCAN_INPUT_DIR", default_value = "input")]
    input: PathBuf,

    /// Directory receiving <name>.txt (and <name>.csv)
    #[arg(long, env = "ORDERSCAN_OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    /// Skip field extraction and the CSV file
    #[arg(long)]
    summary_only: bool,

    /// What to write for a file whose analysis failed: embed, mark or skip
    #[arg(
        long,
        env = "ORDERSCAN_ON_FAILURE",
        default_value = "mark",
        value_parser = clap::builder::ValueParser::new(FailurePolicy::from_str)
    )]
    on_failure: FailurePolicy,

    /// Exit with status 2 when any file failed
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (default: ORDERSCAN_HOST or 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (default: ORDERSCAN_PORT or 8501)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env first so clap's env fallbacks can see its values
    let env_loaded = load_env();
    let cli = Cli::parse();

    match &cli.log_level {
        Some(level) => init_logging_with(level),
        None => init_logging(),
    }

    if let Err(e) = env_loaded {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!(
                "hint: set {} in your environment or in a .env file next to the binary",
                API_KEY_VAR
            );
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("FATAL reason={:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: AppConfig) -> anyhow::Result<ExitCode> {
    print_settings(&config);

    let model: Arc<dyn LanguageModel> =
        Arc::new(OpenAIModel::new(&config.model).context("failed to create the OpenAI client")?);
    let pipeline = DocumentPipeline::new(model, &config);

    match command {
        Command::Batch(args) => run_batch(pipeline, args).await,
        Command::Serve(args) => {
            let mut web_config = WebUiConfig::from_env();
            if let Some(host) = args.host {
                web_config.host = host;
            }
            if let Some(port) = args.port {
                web_config.port = port;
            }
            let server = WebUiServer::new(web_config, Arc::new(pipeline))?;
            println!("Open http://{} in your browser", server.config().bind_addr());
            server.serve().await.context("web server stopped")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_batch(pipeline: DocumentPipeline, args: BatchArgs) -> anyhow::Result<ExitCode> {
    let options = BatchOptions {
        input_dir: args.input,
        output_dir: args.output,
        write_fields_csv: !args.summary_only,
        failure_policy: args.on_failure,
    };
    let input_dir = options.input_dir.clone();

    let report = BatchRunner::new(pipeline, options)
        .run()
        .await
        .with_context(|| format!("batch run over {} failed", input_dir.display()))?;

    print_report(&input_dir, &report);

    if args.strict && report.failed() > 0 {
        info!("BATCH_STRICT_EXIT failed={}", report.failed());
        return Ok(ExitCode::from(EXIT_FILES_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(input_dir: &std::path::Path, report: &BatchReport) {
    if report.input_created {
        println!(
            "Created input directory '{}'. Put PDF files there and run again.",
            input_dir.display()
        );
        return;
    }
    if report.files.is_empty() {
        println!("No PDF files found in '{}'.", input_dir.display());
        return;
    }

    for file in &report.files {
        let marker = if file.is_success() { "ok" } else { "FAILED" };
        println!("[{}] {}", marker, file.input.display());
        for status in &file.save_status {
            println!("    {}", status);
        }
        for failure in &file.failures {
            println!("    {}", failure);
        }
    }
    println!(
        "{} processed, {} succeeded, {} failed",
        report.files.len(),
        report.succeeded(),
        report.failed()
    );
}
