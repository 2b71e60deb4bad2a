use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use okol_canvas::export::{ExportFormat, ExportOutcome};
use okol_canvas::{Command, DrawOptions, RunReport};

#[derive(Debug, Parser)]
#[command(name = "okol-canvas", version, about = "Annotate gallery photos from gesture scripts")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Replay a gesture script over a photo and export the drawing.
    Draw {
        image: PathBuf,
        script: PathBuf,
        #[arg(long, default_value = "png")]
        format: ExportFormat,
        /// Save location; without it the drawing is downloaded into the configured directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the photo URLs of an uploads directory or JSON manifest.
    Gallery { listing: PathBuf },
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Draw {
                image,
                script,
                format,
                out,
            } => Command::Draw(DrawOptions {
                image,
                script,
                format,
                out,
            }),
            CliCommand::Gallery { listing } => Command::Gallery { listing },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let report = match okol_canvas::run(cli.command.into()) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(%err, "okol-canvas failed");
            return Err(err).context("okol-canvas failed");
        }
    };

    match report {
        RunReport::Exported(ExportOutcome::Saved(path))
        | RunReport::Exported(ExportOutcome::Downloaded(path)) => println!("{}", path.display()),
        RunReport::Exported(ExportOutcome::Cancelled) => {}
        RunReport::Listed(urls) => {
            for url in urls {
                println!("{url}");
            }
        }
    }
    Ok(())
}
