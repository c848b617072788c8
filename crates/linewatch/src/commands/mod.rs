//! Command dispatch: bridges CLI args -> dashboard -> output formatting.

pub mod config_cmd;
pub mod machines;
pub mod report;
pub mod show;
pub mod watch;

use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        // Config and completions never touch the store
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "linewatch", &mut std::io::stdout());
            Ok(())
        }

        Command::Machines => machines::handle(global).await,
        Command::Show(args) => show::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
    }
}
