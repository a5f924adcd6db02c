use crate::predict::{run_predict, PredictArgs};
use crate::server;
use churn_engine::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "churn-ds",
    about = "Serve churn predictions over HTTP or score a single record from the command line",
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
    /// Score one JSON record read from a file or stdin and print the response body
    Predict(PredictArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override CHURN_MODEL_DIR
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["churn-ds"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "churn-ds",
            "serve",
            "--port",
            "9000",
            "--model-dir",
            "/tmp/models",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.model_dir, Some(PathBuf::from("/tmp/models")));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn predict_reads_from_a_file_when_given() {
        let cli = Cli::try_parse_from(["churn-ds", "predict", "record.json", "--compact"])
            .expect("parses");
        match cli.command {
            Some(Command::Predict(args)) => {
                assert_eq!(args.input, Some(PathBuf::from("record.json")));
                assert!(args.compact);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
