use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use calc_core::model::CalcId;
use engine::{EngineApi, EngineConfig, HttpEngineClient};
use services::{CalcService, LogPoller, PollConfig, StopReason};
use tracing::{debug, info};
use ui::{AppContext, UiApp, ViewError, build_app_context};

use crate::cli::{Cli, Command, list_filter};

pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const NOT_FOUND: u8 = 3;
    pub const INTERRUPTED: u8 = 130;
}

struct CliApp {
    styled: bool,
    calc_service: Arc<CalcService>,
    log_poller: Arc<LogPoller>,
}

impl UiApp for CliApp {
    fn calc_service(&self) -> Arc<CalcService> {
        Arc::clone(&self.calc_service)
    }

    fn log_poller(&self) -> Arc<LogPoller> {
        Arc::clone(&self.log_poller)
    }

    fn styled_output(&self) -> bool {
        self.styled
    }
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let config = EngineConfig::new(cli.server.clone());
    match cli.timeout_ms {
        Some(ms) => config.with_timeout(Duration::from_millis(ms)),
        None => config,
    }
}

fn poll_config(command: &Command) -> PollConfig {
    let config = PollConfig::from_env();
    match command {
        Command::Log {
            no_drain, stripe, ..
        } => config
            .with_drain_on_finish(!no_drain)
            .with_stripe_rule(*stripe),
        _ => config,
    }
}

fn build_context(cli: &Cli) -> Result<AppContext> {
    let config = engine_config(cli);
    debug!(base_url = %config.base_url, timeout = ?config.timeout, "engine config");
    let client = HttpEngineClient::new(&config)
        .with_context(|| format!("cannot use engine at {}", config.base_url))?;
    let api: Arc<dyn EngineApi> = Arc::new(client);

    let app: Arc<dyn UiApp> = Arc::new(CliApp {
        styled: !cli.no_color && console::colors_enabled(),
        calc_service: Arc::new(CalcService::new(Arc::clone(&api))),
        log_poller: Arc::new(LogPoller::new(api, poll_config(&cli.command))),
    });
    Ok(build_app_context(&app))
}

/// Run the parsed command and return the process exit code.
///
/// # Errors
///
/// Returns engine, service and output failures; `exit_code_for` maps them.
pub async fn run(cli: Cli) -> Result<u8> {
    let ctx = build_context(&cli)?;
    let mut stdout = io::stdout();

    match cli.command {
        Command::List {
            preferred,
            tag,
            running,
            finished,
        } => {
            let filter = list_filter(preferred, tag.as_deref(), running, finished);
            ctx.calc_list().show(&filter, &mut stdout).await?;
        }
        Command::Status { id } => {
            ctx.calc_list().show_status(&id, &mut stdout).await?;
        }
        Command::Results { id } => {
            ctx.calc_list().show_results(&id, &mut stdout).await?;
        }
        Command::Traceback { id } => {
            ctx.calc_list().show_traceback(&id, &mut stdout).await?;
        }
        Command::Log { id, finished, .. } => return follow_log(&ctx, id, !finished).await,
        Command::Action { action, id } => {
            ctx.calc_service().perform(&id, action).await?;
            writeln!(stdout, "{action}: calculation {id}")?;
        }
        Command::Version => {
            let version = ctx.calc_service().engine_version().await?;
            writeln!(stdout, "{version}")?;
        }
    }
    Ok(exit_codes::SUCCESS)
}

async fn follow_log(ctx: &AppContext, id: CalcId, assumed_running: bool) -> Result<u8> {
    let mut viewer = ctx.log_viewer(io::stdout());
    viewer.show(id, assumed_running);

    let reason = tokio::select! {
        reason = viewer.wait() => reason.unwrap_or(StopReason::Cancelled),
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("interrupted");
            StopReason::Cancelled
        }
    };
    viewer.close();

    Ok(match reason {
        StopReason::Finished => exit_codes::SUCCESS,
        StopReason::NotFound => exit_codes::NOT_FOUND,
        StopReason::Failed => exit_codes::FAILURE,
        StopReason::Cancelled => exit_codes::INTERRUPTED,
    })
}

/// Exit code for an error escaping `run`.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let not_found = err
        .downcast_ref::<ViewError>()
        .is_some_and(ViewError::is_not_found)
        || err
            .downcast_ref::<services::CalcServiceError>()
            .is_some_and(services::CalcServiceError::is_not_found);
    if not_found {
        exit_codes::NOT_FOUND
    } else {
        exit_codes::FAILURE
    }
}
