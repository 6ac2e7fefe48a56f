use crate::demo::{run_demo, run_reminder_sweep, DemoArgs, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use clinic_desk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Clinic Desk",
    about = "Run the clinic front-desk service and its reminder tooling from the command line",
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
    /// Reminder maintenance against a record-store export
    Reminders {
        #[command(subcommand)]
        command: RemindersCommand,
    },
    /// Walk through an enquiry reminder cycle on a simulated clock
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RemindersCommand {
    /// Run one expiry sweep and print what would be returned to pending
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON export of enquiry documents to load at start-up
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Reminders {
            command: RemindersCommand::Sweep(args),
        } => run_reminder_sweep(args),
        Command::Demo(args) => run_demo(args),
    }
}
