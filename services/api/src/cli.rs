use crate::demo::{run_analysis_report, run_demo, run_persona_listing, AnalyzeArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use comp_rank::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Comparable Ranking Engine",
    about = "Rank a subject property against market comparables and size price moves",
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
    /// Rank a subject against comparables from a JSON request or CSV export
    Analyze(AnalyzeArgs),
    /// List the configured weight personas
    Personas,
    /// Run the analysis on a bundled sample market
    Demo(DemoArgs),
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
        Command::Analyze(args) => run_analysis_report(args),
        Command::Personas => run_persona_listing(),
        Command::Demo(args) => run_demo(args),
    }
}
