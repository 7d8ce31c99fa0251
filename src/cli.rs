//! Command line options for the overleaf-mover tool
use clap::Parser;
use std::path::PathBuf;

use crate::config::RunConfig;
use crate::errors::OverleafMoverError;
use crate::migrate::Migration;
use crate::overleaf::SourceRef;

/// overleaf-mover - Move an Overleaf project to a new GitLab repository
#[derive(Parser, Default, Clone, Debug)]
pub struct OverleafMoverCli {
    /// Overleaf project URL (web or git) or project hash
    pub source: String,

    /// Directory where the project will be cloned
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl OverleafMoverCli {
    /// The log level the `-v` count asks for.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Run the overleaf-mover tool with the provided command line options
///
/// # Errors
/// Any fatal pipeline error; the message names the failing stage.
pub async fn overleaf_mover_main() -> Result<(), OverleafMoverError> {
    let args = OverleafMoverCli::parse();
    env_logger::builder()
        .filter_level(args.log_level())
        .format_target(false)
        .format_timestamp(None)
        .init();
    let source = SourceRef::parse(&args.source)?;
    let config = RunConfig::resolve(&args)?;
    let migration = Migration::new(config, source);
    let done = migration.run().await?;
    log::info!("Migration finished at stage '{}'", done.stage());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        let mut cli = OverleafMoverCli::default();
        assert_eq!(cli.log_level(), log::LevelFilter::Info);
        cli.verbose = 1;
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        cli.verbose = 3;
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn parses_single_positional_argument() {
        let cli = OverleafMoverCli::parse_from(["overleaf-mover", "5f3b2a1c9d8e7f"]);
        assert_eq!(cli.source, "5f3b2a1c9d8e7f");
        assert_eq!(cli.dir, PathBuf::from("."));
    }

    #[test]
    fn parses_dir_and_verbosity() {
        let cli = OverleafMoverCli::parse_from([
            "overleaf-mover",
            "-d",
            "/tmp",
            "-vv",
            "https://www.overleaf.com/project/5f3b2a1c9d8e7f",
        ]);
        assert_eq!(cli.dir, PathBuf::from("/tmp"));
        assert_eq!(cli.verbose, 2);
    }
}
