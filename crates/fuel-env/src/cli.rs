//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Create and deploy a Fuel environment from a JSON settings file.
#[derive(Parser, Debug)]
#[command(name = "fuel-env")]
#[command(author, version = env!("FUEL_ENV_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Path to the environment settings JSON
    pub settings: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "fuel-env",
            "-vv",
            "--json-logs",
            "--log-file",
            "/tmp/fuel-env.log",
            "env.json",
        ])
        .unwrap();
        assert_eq!(cli.settings, PathBuf::from("env.json"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_logs);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/fuel-env.log")));
    }

    #[test]
    fn settings_path_is_required() {
        let err = Cli::try_parse_from(["fuel-env"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
