use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use supplier_compliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Supplier Compliance",
    about = "Run the supplier compliance workflow service or walk through a demo",
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
    /// Run an end-to-end questionnaire and grade verification walkthrough
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
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["supplier-compliance"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn demo_accepts_grade_override() {
        let cli = Cli::try_parse_from(["supplier-compliance", "demo", "--grade", "d"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.grade.map(|grade| grade.label()), Some("D"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
