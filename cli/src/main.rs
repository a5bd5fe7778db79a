//! Command-line front-end for `schema-engine`.
//!
//! Reads a JSON Schema and a JSON instance, validates the instance against the schema, and
//! prints the result in one of the four standard output formats. Exit codes follow the
//! engine's external interface: 0 valid, 1 invalid, 2 usage error, 3 schema error.

use std::{
    fs,
    io::{self, Read as _},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, ValueEnum};
use schema_engine::Draft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Flag,
    Basic,
    Detailed,
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DraftArg {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl From<DraftArg> for Draft {
    fn from(value: DraftArg) -> Draft {
        match value {
            DraftArg::Draft4 => Draft::Draft4,
            DraftArg::Draft6 => Draft::Draft6,
            DraftArg::Draft7 => Draft::Draft7,
            DraftArg::Draft201909 => Draft::Draft201909,
            DraftArg::Draft202012 => Draft::Draft202012,
        }
    }
}

/// Validate a JSON instance against a JSON Schema.
#[derive(Debug, Parser)]
#[command(name = "schema-engine", version, about)]
struct Cli {
    /// Path to the JSON Schema document.
    schema: PathBuf,

    /// Path to the JSON instance to validate. Reads from stdin when omitted or `-`.
    instance: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "basic")]
    output: OutputFormat,

    /// Force a specific draft instead of auto-detecting `$schema`.
    #[arg(long, value_enum)]
    draft: Option<DraftArg>,
}

fn read_json(path: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let raw = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let schema = match fs::read_to_string(&cli.schema) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("error: failed to read schema {}: {error}", cli.schema.display());
            return ExitCode::from(2);
        }
    };
    let schema: serde_json::Value = match serde_json::from_str(&schema) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error: schema {} is not valid JSON: {error}", cli.schema.display());
            return ExitCode::from(2);
        }
    };
    let instance = match read_json(cli.instance.as_deref()) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error: failed to read instance: {error}");
            return ExitCode::from(2);
        }
    };

    let mut options = schema_engine::options();
    if let Some(draft) = cli.draft {
        options.with_draft(draft.into());
    }

    let validator = match options.build(&schema) {
        Ok(validator) => validator,
        Err(error) => {
            eprintln!("error: invalid schema: {error}");
            return ExitCode::from(3);
        }
    };

    tracing::debug!(output = ?cli.output, "validating instance");
    let output = validator.apply(&instance);
    let is_valid = output.flag();

    let rendered = match cli.output {
        OutputFormat::Flag => serde_json::json!({ "valid": is_valid }),
        OutputFormat::Basic => serde_json::to_value(output.basic()).expect("output is serializable"),
        OutputFormat::Detailed => {
            serde_json::to_value(output.detailed()).expect("output is serializable")
        }
        OutputFormat::Verbose => {
            serde_json::to_value(output.verbose()).expect("output is serializable")
        }
    };
    println!("{}", serde_json::to_string_pretty(&rendered).expect("value is serializable"));

    if is_valid {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_arg_maps_onto_engine_draft() {
        assert_eq!(Draft::from(DraftArg::Draft7), Draft::Draft7);
        assert_eq!(Draft::from(DraftArg::Draft202012), Draft::Draft202012);
    }

    #[test]
    fn read_json_reads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("instance.json");
        fs::write(&path, r#"{"a": 1}"#).expect("write instance");
        let value = read_json(Some(&path)).expect("valid json");
        assert_eq!(value, serde_json::json!({"a": 1}));
    }
}
