mod cli;
mod command;
mod config;
mod dispatch;
mod error;
mod format;
mod prefs;
mod text;

use error::WrapErr;

use clap::CommandFactory;
use clap::Parser;

#[tokio::main]
async fn main() -> error::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let cfg = config::Config::load().context("Load configuration error")?;
    let command_line = cli::Cli::parse();

    if let Some(command) = command_line.command {
        let cmd: Box<dyn command::Command> = match command {
            cli::Commands::Serve => Box::new(command::ServeCommand::new(cfg)),
            cli::Commands::Probe { input } => Box::new(command::ProbeCommand::new(cfg, input)),
        };
        cmd.execute().await?;
    } else {
        cli::Cli::command().print_help()?;
    }

    Ok(())
}
