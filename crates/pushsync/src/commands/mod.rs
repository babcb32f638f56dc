//! Command dispatch: bridges CLI args -> engine runs -> output formatting.

pub mod config_cmd;
pub mod reconcile;
pub mod session;
pub mod topics;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a sync command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Reconcile(args) => reconcile::handle(args, global).await,
        Command::Session(args) => session::handle(args, global).await,
        Command::Topics(args) => topics::handle(args, global),
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
