//! Command-line flags.

use calc_core::model::{CalcAction, CalcId, ListFilter};
use clap::{ArgAction, Parser, Subcommand};
use engine::config::{DEFAULT_SERVER_URL, SERVER_URL_ENV, TIMEOUT_ENV};
use services::StripeRule;

/// Follow calculation logs on a remote engine.
#[derive(Parser, Debug)]
#[command(name = "calcwatch", version, about)]
pub struct Cli {
    /// Engine base URL.
    #[arg(long, global = true, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Per-request timeout in milliseconds (30 s when unset).
    #[arg(long, global = true, env = TIMEOUT_ENV)]
    pub timeout_ms: Option<u64>,

    /// Raise log verbosity on stderr; repeat for more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Never style output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List calculations, newest first.
    List {
        /// Only preferred calculations.
        #[arg(long)]
        preferred: bool,

        /// Only calculations carrying this tag.
        #[arg(long)]
        tag: Option<String>,

        #[arg(long, conflicts_with = "finished")]
        running: bool,

        #[arg(long)]
        finished: bool,
    },

    /// Show the status of one calculation.
    Status { id: CalcId },

    /// List the exportable outputs of a calculation.
    Results { id: CalcId },

    /// Print the traceback of a failed calculation.
    Traceback { id: CalcId },

    /// Follow a calculation log until it finishes.
    Log {
        id: CalcId,

        /// The calculation is believed to have finished already.
        #[arg(long)]
        finished: bool,

        /// Skip the last fetch after the engine reports completion.
        #[arg(long)]
        no_drain: bool,

        /// Which lines advance the stripe: `all` or `non-blank`.
        #[arg(long, default_value_t = StripeRule::AllLines)]
        stripe: StripeRule,
    },

    /// Abort, remove, share or unshare a calculation.
    Action { action: CalcAction, id: CalcId },

    /// Print the engine version.
    Version,
}

impl Cli {
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// List filter for `list` flags.
#[must_use]
pub fn list_filter(preferred: bool, tag: Option<&str>, running: bool, finished: bool) -> ListFilter {
    let mut filter = ListFilter::default();
    if preferred {
        filter = filter.preferred_only();
    }
    if let Some(tag) = tag {
        filter = filter.with_tag(tag);
    }
    let is_running = match (running, finished) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    filter.with_running(is_running)
}
