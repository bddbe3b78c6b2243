use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity. Can be used multiple times (e.g., -v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen on the unix socket and answer panel requests
    Serve,
    /// Run one input through the full dispatch pipeline and print the panels
    Probe {
        /// Input to dispatch, as if typed into the search box
        input: String,
    },
}
