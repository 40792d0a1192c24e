use crate::demo::{run_demo, run_match, DemoArgs, MatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sarvam_setu::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sarvam Setu",
    about = "Run the Sarvam Setu eligibility questionnaire service or try it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Play a scripted questionnaire conversation and print every outbound message
    Demo(DemoArgs),
    /// Match a set of answers against the rule catalog and print the results
    Match(MatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Match(args) => run_match(args).await,
    }
}
