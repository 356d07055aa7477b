//! Command-line arguments.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use courier_domain::BodySyntax;

/// Edits, checks and resolves variable-templated request bodies.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Settings file to use instead of the one in the config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replace every marker with its value, ready to send.
    Resolve {
        /// Body document containing `{{type:id}}` markers.
        file: PathBuf,

        /// JSON file holding the variable list.
        #[arg(short, long, value_name = "PATH")]
        variables: Option<PathBuf>,

        /// Body syntax: json, xml or text. Guessed from the extension when omitted.
        #[arg(short, long)]
        syntax: Option<BodySyntax>,

        /// Text written in place of markers without a usable value.
        #[arg(short, long, value_name = "TEXT")]
        placeholder: Option<String>,

        /// Write timestamps in milliseconds instead of seconds.
        #[arg(long)]
        millis: bool,
    },

    /// Pretty-print the document, keeping markers in place.
    Format {
        /// Body document.
        file: PathBuf,

        /// Body syntax: json, xml or text. Guessed from the extension when omitted.
        #[arg(short, long)]
        syntax: Option<BodySyntax>,
    },

    /// Report whether the document is valid for its syntax.
    Check {
        /// Body document.
        file: PathBuf,

        /// Body syntax: json, xml or text. Guessed from the extension when omitted.
        #[arg(short, long)]
        syntax: Option<BodySyntax>,
    },

    /// Replay a scripted editing session and print the resulting document
    /// and variables.
    Edit {
        /// Session script, one step per line.
        script: PathBuf,

        /// Body syntax of the edited document.
        #[arg(short, long, default_value_t = BodySyntax::Json)]
        syntax: BodySyntax,
    },

    /// Print the settings file location and the effective settings.
    Settings {
        /// Write the effective settings to the settings file.
        #[arg(long)]
        init: bool,
    },
}

/// Picks the syntax given on the command line, or guesses it from the file
/// extension.
pub fn syntax_for(path: &Path, explicit: Option<BodySyntax>) -> BodySyntax {
    explicit.unwrap_or_else(|| {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => BodySyntax::Json,
            Some("xml") => BodySyntax::Xml,
            _ => BodySyntax::Text,
        }
    })
}
