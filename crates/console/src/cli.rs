use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ocrdesk")]
#[command(about = "Submit images to the OCR service and track them until they finish")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload one or more files as a single batch and watch them
    Submit {
        /// Image or PDF files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Submit an image by URL and watch it
    SubmitUrl {
        url: String,
    },
    /// Browse recognition history
    #[command(subcommand)]
    Results(ResultCommands),
}

#[derive(Subcommand)]
pub enum ResultCommands {
    /// List every stored result with a short preview
    List,
    /// Show the full text of one result
    Show {
        id: i64,
    },
    /// Write one result's text to `ocr_result_<id>.txt`
    Export {
        id: i64,
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete one result
    Delete {
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_takes_many_files() {
        let cli = Cli::try_parse_from(["ocrdesk", "submit", "a.png", "b.png"]).unwrap();
        match cli.command {
            Commands::Submit { files } => {
                assert_eq!(files, [PathBuf::from("a.png"), PathBuf::from("b.png")]);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn submit_without_files_is_rejected() {
        assert!(Cli::try_parse_from(["ocrdesk", "submit"]).is_err());
    }

    #[test]
    fn export_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["ocrdesk", "results", "export", "7"]).unwrap();
        match cli.command {
            Commands::Results(ResultCommands::Export { id, out }) => {
                assert_eq!(id, 7);
                assert_eq!(out, PathBuf::from("."));
            }
            _ => panic!("expected results export"),
        }
    }
}
