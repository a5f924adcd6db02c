use crate::infra::build_engine;
use churn_engine::config::AppConfig;
use churn_engine::error::AppError;
use churn_engine::telemetry;
use clap::Args;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// JSON file holding the request body; stdin when omitted
    pub(crate) input: Option<PathBuf>,
    /// Override CHURN_MODEL_DIR
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
    /// Print the response on a single line
    #[arg(long)]
    pub(crate) compact: bool,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = args.model_dir {
        config.model.model_dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let payload = parse_payload(&raw)?;

    let engine = build_engine(&config.model);
    let response = engine.respond(&payload);

    let rendered = if args.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{rendered}");
    Ok(())
}

/// Blank input scores an empty record, matching an empty HTTP body.
fn parse_payload(raw: &str) -> Result<Value, AppError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(raw)?)
}
