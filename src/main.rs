use anyhow::Result;
#[cfg(feature = "completions")]
use clap::CommandFactory;
use clap::Parser;
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use audiobrief::cli::{Cli, Commands};
use audiobrief::config::{Config, ValidatedConfig};
use audiobrief::diagnostics::check_configuration;
use audiobrief::logging::Logger;
use audiobrief::pipeline::{Pipeline, PipelineConfig, RunReport};
use audiobrief::speech::client::AzureSpeechClient;
use audiobrief::speech::poller::PollPolicy;
use audiobrief::speech::transcript::Transcripts;
use audiobrief::summarize::client::{ChatSummarizer, SummaryOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file; load it before anything
    // reads the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    Logger::init(cli.verbose, cli.quiet)?;

    match &cli.command {
        None | Some(Commands::Run) => {
            run_command(&cli).await?;
        }
        Some(Commands::Daemon { interval }) => {
            daemon_command(&cli, *interval).await?;
        }
        Some(Commands::Check) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_cli_overrides(&mut config, &cli);
            if !check_configuration(&config) {
                std::process::exit(1);
            }
        }
        #[cfg(feature = "completions")]
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "audiobrief",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Run one pipeline cycle and print the result.
async fn run_command(cli: &Cli) -> Result<()> {
    let validated = resolve_config(cli)?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let pipeline = build_pipeline(&validated, cancel);
    let report = pipeline.run_once().await?;
    print_report(&report, cli.quiet);

    Ok(())
}

/// Run pipeline cycles until SIGINT or SIGTERM.
async fn daemon_command(cli: &Cli, interval: Option<u64>) -> Result<()> {
    let mut validated = resolve_config(cli)?;
    if let Some(secs) = interval {
        validated.run_interval_secs = secs;
    }

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    log::info!(
        "Starting continuous mode, {}s between cycles",
        validated.run_interval_secs
    );
    let pipeline = build_pipeline(&validated, cancel);
    pipeline.run_forever().await?;

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/audiobrief/config.toml)
/// 3. Built-in defaults
///
/// Environment variables override values from any of these sources.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides()?)
}

/// Load, override, and validate configuration for a pipeline run.
fn resolve_config(cli: &Cli) -> Result<ValidatedConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, cli);

    match config.validate() {
        Ok(validated) => Ok(validated),
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            eprintln!("Run `audiobrief check` to see what is missing.");
            std::process::exit(1);
        }
    }
}

/// CLI flags win over both the config file and environment variables.
///
/// An explicit input source replaces whichever one was configured, so a
/// `--audio-uri` flag works even when the config file names a container.
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref uri) = cli.audio_uri {
        config.speech.audio_uri = Some(uri.clone());
        config.speech.container_uri = None;
    }
    if let Some(ref uri) = cli.container_uri {
        config.speech.container_uri = Some(uri.clone());
        config.speech.audio_uri = None;
    }
    if let Some(ref locale) = cli.locale {
        config.speech.locale = locale.clone();
    }
    if let Some(secs) = cli.poll_interval {
        config.run.poll_interval_secs = secs;
    }
    if let Some(attempts) = cli.max_poll_attempts {
        config.run.max_poll_attempts = attempts;
    }
}

/// Wire the real service clients into a pipeline.
fn build_pipeline(validated: &ValidatedConfig, cancel: CancellationToken) -> Pipeline {
    let speech = Arc::new(AzureSpeechClient::new(
        &validated.speech_key,
        &validated.speech_endpoint,
    ));
    let summarizer = Arc::new(
        ChatSummarizer::new(
            &validated.openai_key,
            &validated.openai_endpoint,
            &validated.deployment,
        )
        .with_options(SummaryOptions {
            length_directive: format!("{} words", validated.summary_words),
            ..SummaryOptions::default()
        }),
    );

    let mut config = PipelineConfig::new(validated.input.clone());
    config.options.locale = validated.locale.clone();
    config.poll = PollPolicy {
        poll_interval: Duration::from_secs(validated.poll_interval_secs),
        max_attempts: validated.max_poll_attempts,
    };
    config.run_interval = Duration::from_secs(validated.run_interval_secs);

    Pipeline::new(config, speech, summarizer).with_cancellation(cancel)
}

/// Print the outcome of one pipeline cycle.
///
/// Quiet mode prints only the summary, one line of output for scripts.
fn print_report(report: &RunReport, quiet: bool) {
    if quiet {
        println!("{}", report.summary);
        return;
    }

    match &report.transcripts {
        Transcripts::Single(text) => {
            println!("{}", "Transcript:".dimmed());
            println!("{}", text);
        }
        Transcripts::PerResource(by_name) => {
            for (name, text) in by_name {
                println!("{}", format!("--- {} ---", name).dimmed());
                println!("{}", text);
            }
        }
    }

    println!();
    println!("{}", "Summary:".green());
    println!("{}", report.summary);
}

/// Fire the token on SIGINT or SIGTERM so in-flight waits stop cleanly.
async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = wait_for_sigterm() => {}
    }

    log::info!("Shutdown signal received");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            log::error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
