use crate::demo::{run_assess, run_demo, run_estimate, AssessArgs, DemoArgs, EstimateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use counselor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Counselor",
    about = "Run the admission chances service or score profiles from the command line",
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
    /// Score a profile against a school from JSON files
    Chances {
        #[command(subcommand)]
        command: ChancesCommand,
    },
    /// Print statistical estimates for the bundled sample student
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ChancesCommand {
    /// Deterministic estimate without any completion calls
    Estimate(EstimateArgs),
    /// Holistic assessment through the configured completion endpoint
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Subscription tier for the sample student (defaults to premium)
    #[arg(long)]
    pub(crate) demo_tier: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Chances {
            command: ChancesCommand::Estimate(args),
        } => run_estimate(args),
        Command::Chances {
            command: ChancesCommand::Assess(args),
        } => run_assess(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
