use crate::demo::{run_attend, run_demo, run_distance, AttendArgs, DemoArgs, DistanceArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fitbuddy_attendance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "FitBuddy Attendance",
    about = "Run the attendance geofence service or simulate check-ins from the command line",
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
    /// Print the haversine distance between two points
    Distance(DistanceArgs),
    /// Run one check-in against a simulated device
    Attend(AttendArgs),
    /// Walk through on-site, out-of-range and dead-GPS check-ins
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
        Command::Distance(args) => run_distance(args),
        Command::Attend(args) => run_attend(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
