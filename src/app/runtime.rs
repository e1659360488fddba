use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{config_runtime, terminal};
use crate::app_config::load_default_file_config;
use crate::cli::Command;
use crate::{ProcessExit, commands};

pub(crate) async fn run_finsight() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded = load_default_file_config()?;
    let cli = config_runtime::apply_config_defaults(cli, &cli_sources, loaded.config.as_ref())?;

    let default_level = config_runtime::resolve_default_log_level(&cli);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    terminal::init_tracing(default_level, force_cli_log_level);

    debug!(
        config_path = ?loaded.path,
        config_loaded = loaded.config.is_some(),
        "configuration resolved"
    );
    info!(version = env!("CARGO_PKG_VERSION"), "finsight starting");

    match &cli.command {
        Command::Download(args) => {
            commands::run_download_command(args, cli.quiet, cancel_on_ctrl_c()).await
        }
        Command::Fetch(args) => commands::run_fetch_command(args, cancel_on_ctrl_c()).await,
        Command::Validate(args) => commands::run_validate_command(args).await,
        Command::Companies(args) => {
            commands::run_companies_command(args)?;
            Ok(ProcessExit::Success)
        }
    }
}

/// Token cancelled on the first Ctrl-C; in-flight fetches then end as timeouts.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling in-flight requests");
            trigger.cancel();
        }
    });
    token
}
