use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::{Cli, Command, RetryArgs};
use finsight_core::ingest::ContentPolicy;

/// Which flags the user typed explicitly; those win over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
    pub(crate) output_dir: bool,
    pub(crate) concurrency: bool,
    pub(crate) rate_limit: bool,
    pub(crate) reject_unsafe: bool,
    pub(crate) max_retries: bool,
    pub(crate) initial_delay_ms: bool,
    pub(crate) timeout_secs: bool,
}

impl CliValueSources {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Self {
        let mut sources = Self {
            verbose: is_commandline_value(matches, "verbose"),
            quiet: is_commandline_value(matches, "quiet"),
            ..Self::default()
        };

        let Some((name, sub)) = matches.subcommand() else {
            return sources;
        };
        sources.verbose |= is_commandline_value(sub, "verbose");
        sources.quiet |= is_commandline_value(sub, "quiet");

        if matches!(name, "download" | "fetch") {
            sources.max_retries = is_commandline_value(sub, "max_retries");
            sources.initial_delay_ms = is_commandline_value(sub, "initial_delay_ms");
            sources.timeout_secs = is_commandline_value(sub, "timeout_secs");
            sources.reject_unsafe = is_commandline_value(sub, "reject_unsafe");
        }
        if name == "download" {
            sources.output_dir = is_commandline_value(sub, "output_dir");
            sources.concurrency = is_commandline_value(sub, "concurrency");
            sources.rate_limit = is_commandline_value(sub, "rate_limit");
        }
        sources
    }
}

pub(crate) fn parse_cli_with_sources() -> (Cli, CliValueSources) {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (cli, CliValueSources::from_matches(&matches))
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills flags the user did not type from the config file, then checks the
/// effective values.
pub(crate) fn apply_config_defaults(
    mut cli: Cli,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Cli> {
    let Some(file_config) = file_config else {
        return Ok(cli);
    };

    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file_config.verbosity
    {
        apply_config_verbosity(&mut cli, verbosity);
    }

    match &mut cli.command {
        Command::Download(args) => {
            if !cli_sources.output_dir
                && args.output_dir.is_none()
                && let Some(output_dir) = &file_config.output_dir
            {
                args.output_dir = Some(output_dir.clone());
            }
            if !cli_sources.concurrency
                && let Some(concurrency) = file_config.concurrency
            {
                args.concurrency = concurrency;
            }
            if !cli_sources.rate_limit
                && let Some(rate_limit) = file_config.rate_limit
            {
                args.rate_limit = rate_limit;
            }
            if !cli_sources.reject_unsafe
                && let Some(policy) = file_config.content_policy
            {
                args.reject_unsafe = policy == ContentPolicy::Reject;
            }
            apply_retry_defaults(&mut args.retry, cli_sources, file_config);

            if !(1..=100).contains(&args.concurrency) {
                bail!(
                    "Invalid effective concurrency value: {}. Expected range: 1..=100",
                    args.concurrency
                );
            }
            if args.rate_limit > 60_000 {
                bail!(
                    "Invalid effective rate_limit value: {}. Expected range: 0..=60000",
                    args.rate_limit
                );
            }
        }
        Command::Fetch(args) => {
            if !cli_sources.reject_unsafe
                && let Some(policy) = file_config.content_policy
            {
                args.reject_unsafe = policy == ContentPolicy::Reject;
            }
            apply_retry_defaults(&mut args.retry, cli_sources, file_config);
        }
        Command::Validate(_) | Command::Companies(_) => {}
    }

    Ok(cli)
}

fn apply_retry_defaults(
    retry: &mut RetryArgs,
    cli_sources: &CliValueSources,
    file_config: &FileConfig,
) {
    if !cli_sources.max_retries
        && let Some(max_retries) = file_config.max_retries
    {
        retry.max_retries = max_retries;
    }
    if !cli_sources.initial_delay_ms
        && let Some(initial_delay_ms) = file_config.initial_delay_ms
    {
        retry.initial_delay_ms = initial_delay_ms;
    }
    if !cli_sources.timeout_secs
        && let Some(timeout_secs) = file_config.attempt_timeout_secs
    {
        retry.timeout_secs = timeout_secs;
    }
}

fn apply_config_verbosity(cli: &mut Cli, verbosity: VerbositySetting) {
    let (verbose, quiet) = match verbosity {
        VerbositySetting::Default => (0, false),
        VerbositySetting::Verbose => (1, false),
        VerbositySetting::Quiet => (0, true),
        VerbositySetting::Debug => (2, false),
    };
    cli.verbose = verbose;
    cli.quiet = quiet;
}

pub(crate) fn resolve_default_log_level(cli: &Cli) -> &'static str {
    if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Explicit `-v`/`-q` beat `RUST_LOG`; otherwise `RUST_LOG` beats the default.
pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
