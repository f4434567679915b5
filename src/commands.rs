//! Command handlers

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::batch::{read_plate_file, run_batch};
use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{print_batch, print_outcome, CsvReporter};
use crate::query::run_query;
use crate::session::WebDriverProvider;
use crate::types::PlateStatus;

/// Process exit code for an interrupted run
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map a single-query outcome status to the process exit code
pub fn exit_code_for(status: PlateStatus) -> i32 {
    match status {
        PlateStatus::Available => 0,
        PlateStatus::Unavailable => 1,
        PlateStatus::Unknown | PlateStatus::Error => 2,
    }
}

/// Execute CLI command, returning the process exit code
pub fn execute(cli: Cli) -> Result<i32> {
    let mut config = Config::load()?;

    // Override from CLI args for this run only
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(retries) = cli.retries {
        config.max_retries = retries;
    }
    if let Some(delay) = cli.delay {
        config.query_delay_secs = delay;
    }
    if cli.no_headless {
        config.headless = false;
    }
    if cli.user_agent.is_some() {
        config.user_agent = cli.user_agent.clone();
    }

    let format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Check { ref plate } => {
            let interrupt = register_interrupt()?;
            cmd_check(&config, plate, format, &interrupt)
        }

        Commands::Batch {
            ref plates,
            ref file,
            ref output,
        } => {
            let interrupt = register_interrupt()?;
            cmd_batch(
                &config,
                plates.clone(),
                file.clone(),
                output.clone(),
                format,
                &interrupt,
            )
        }

        Commands::Config {
            show,
            ref set_webdriver_url,
            ref set_entry_url,
            set_timeout,
            set_retries,
            set_backoff,
            set_delay,
            set_headless,
            ref set_user_agent,
            set_output,
            reset,
        } => cmd_config(
            &mut config,
            show,
            set_webdriver_url.clone(),
            set_entry_url.clone(),
            set_timeout,
            set_retries,
            set_backoff,
            set_delay,
            set_headless,
            set_user_agent.clone(),
            set_output,
            reset,
        ),
    }
}

/// SIGINT sets a flag; the query and batch loops abort at their next
/// checkpoint and the process exits with 130.
fn register_interrupt() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))?;
    Ok(flag)
}

fn cmd_check(
    config: &Config,
    plate: &str,
    format: OutputFormat,
    interrupt: &AtomicBool,
) -> Result<i32> {
    let provider = WebDriverProvider::new(config.session_config());
    let policy = config.retry_policy();
    let classifier = config.classifier();

    let outcome = run_query(&provider, plate, &policy, &classifier, interrupt);

    if interrupt.load(Ordering::Relaxed) {
        eprintln!("\nSearch interrupted");
        return Ok(EXIT_INTERRUPTED);
    }

    print_outcome(format, &outcome)?;
    Ok(exit_code_for(outcome.status))
}

fn cmd_batch(
    config: &Config,
    mut inputs: Vec<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
    interrupt: &AtomicBool,
) -> Result<i32> {
    if let Some(ref path) = file {
        inputs.extend(read_plate_file(path)?);
    }
    if inputs.is_empty() {
        return Err(Error::NoPlates);
    }

    info!("starting batch of {} plates", inputs.len());

    let provider = WebDriverProvider::new(config.session_config());
    let policy = config.retry_policy();
    let classifier = config.classifier();

    let mut reporter = match output {
        Some(ref path) => Some(CsvReporter::create(path)?),
        None => None,
    };

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let result = run_batch(
        &provider,
        &inputs,
        &policy,
        &classifier,
        config.query_delay(),
        interrupt,
        |outcome| {
            if let Some(ref mut reporter) = reporter {
                reporter.write(outcome)?;
            }
            progress.println(format!(
                "{}: {} - {}",
                outcome.plate,
                outcome.status.label(),
                first_line(&outcome.message)
            ));
            progress.inc(1);
            Ok(())
        },
    )?;

    if result.interrupted {
        progress.abandon_with_message("interrupted");
    } else {
        progress.finish_and_clear();
    }

    print_batch(format, &result)?;

    if let Some(ref path) = output {
        println!("\nResults saved to: {}", path.display());
    }

    if result.interrupted {
        return Ok(EXIT_INTERRUPTED);
    }
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    config: &mut Config,
    show: bool,
    set_webdriver_url: Option<String>,
    set_entry_url: Option<String>,
    set_timeout: Option<u64>,
    set_retries: Option<u32>,
    set_backoff: Option<u64>,
    set_delay: Option<u64>,
    set_headless: Option<bool>,
    set_user_agent: Option<String>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<i32> {
    if reset {
        *config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(0);
    }

    let mut changed = false;

    if let Some(url) = set_webdriver_url {
        config.webdriver_url = url;
        changed = true;
    }
    if let Some(url) = set_entry_url {
        config.entry_url = url;
        changed = true;
    }
    if let Some(timeout) = set_timeout {
        config.timeout_secs = timeout;
        changed = true;
    }
    if let Some(retries) = set_retries {
        config.max_retries = retries;
        changed = true;
    }
    if let Some(backoff) = set_backoff {
        config.backoff_secs = backoff;
        changed = true;
    }
    if let Some(delay) = set_delay {
        config.query_delay_secs = delay;
        changed = true;
    }
    if let Some(headless) = set_headless {
        config.headless = headless;
        changed = true;
    }
    if let Some(agent) = set_user_agent {
        config.user_agent = if agent.is_empty() { None } else { Some(agent) };
        changed = true;
    }
    if let Some(output_format) = set_output {
        config.output_format = output_format;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !changed {
        println!("{}", config);
    }

    Ok(0)
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_per_status() {
        assert_eq!(exit_code_for(PlateStatus::Available), 0);
        assert_eq!(exit_code_for(PlateStatus::Unavailable), 1);
        assert_eq!(exit_code_for(PlateStatus::Unknown), 2);
        assert_eq!(exit_code_for(PlateStatus::Error), 2);
        assert_eq!(EXIT_INTERRUPTED, 130);
    }

    #[test]
    fn first_line_truncates_multiline_messages() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }
}
