//! Courier - Main Entry Point
//!
//! Command-line front end for the variable-templated body editor: resolves
//! markers for sending, formats and checks bodies, and replays scripted
//! editing sessions.

mod cli;
mod script;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use courier_application::format::{self, FormatOutcome};
use courier_application::{ResolveOptions, VariableResolver};
use courier_domain::{
    BodySyntax, DomainError, EditorSettings, SyntaxStatus, TimestampUnit, Variable, validate_id,
};
use courier_infrastructure::{
    SerializationError, SettingsError, SettingsRepository, SystemClock, from_json, to_json_stable,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Args, Command, syntax_for};
use crate::script::{ScriptError, Session, parse_script};

/// Errors reported by the command line.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("variables: {0}")]
    Variables(SerializationError),

    #[error("variables: {0}")]
    InvalidVariable(#[from] DomainError),

    #[error("output: {0}")]
    Output(SerializationError),

    #[error("invalid {syntax}: {message}")]
    Invalid { syntax: BodySyntax, message: String },

    #[error("formatting would change the document's markers")]
    MarkersChanged,

    #[error("script: {0}")]
    Script(#[from] ScriptError),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_deref()).await?;

    match args.command {
        Command::Resolve {
            file,
            variables,
            syntax,
            placeholder,
            millis,
        } => {
            let syntax = syntax_for(&file, syntax);
            let mut options = ResolveOptions::from_settings(&settings, syntax);
            if let Some(placeholder) = placeholder {
                options.missing_data_placeholder = placeholder;
            }
            if millis {
                options.timestamp_unit = TimestampUnit::Milliseconds;
            }
            let variables = match variables {
                Some(path) => load_variables(&path).await?,
                None => Vec::new(),
            };
            resolve(&read(&file).await?, &variables, options);
        }
        Command::Format { file, syntax } => {
            let syntax = syntax_for(&file, syntax);
            let formatted = pretty_print(&read(&file).await?, syntax, &settings)?;
            print!("{formatted}");
        }
        Command::Check { file, syntax } => {
            let syntax = syntax_for(&file, syntax);
            check(&read(&file).await?, syntax)?;
            println!("valid {syntax}");
        }
        Command::Edit { script, syntax } => edit(&script, syntax, settings).await?,
        Command::Settings { init } => {
            let path = args.config.or_else(SettingsRepository::get_settings_path);
            show_settings(path.as_deref(), &settings, init).await?;
        }
    }

    Ok(())
}

async fn load_settings(path: Option<&Path>) -> Result<EditorSettings, CliError> {
    let repository = SettingsRepository::new();
    let settings = match path {
        Some(path) => repository.load_from(path).await?,
        None => repository.load().await.unwrap_or_else(|error| {
            tracing::warn!(%error, "ignoring unreadable settings");
            EditorSettings::default()
        }),
    };
    Ok(settings)
}

async fn read(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })
}

async fn load_variables(path: &Path) -> Result<Vec<Variable>, CliError> {
    let variables: Vec<Variable> = from_json(&read(path).await?).map_err(CliError::Variables)?;
    for variable in &variables {
        validate_id(&variable.id)?;
    }
    Ok(variables)
}

async fn show_settings(
    path: Option<&Path>,
    settings: &EditorSettings,
    init: bool,
) -> Result<(), CliError> {
    if init {
        let repository = SettingsRepository::new();
        match path {
            Some(path) => repository.save_to(path, settings).await?,
            None => repository.save(settings).await?,
        }
        tracing::info!(path = ?path.map(Path::display), "settings written");
    }

    let location = path.map_or_else(|| "<no config directory>".to_string(), |p| p.display().to_string());
    println!("{location}");
    print!("{}", to_json_stable(settings).map_err(CliError::Output)?);
    Ok(())
}

fn resolve(document: &str, variables: &[Variable], options: ResolveOptions) {
    let resolver = VariableResolver::new(Arc::new(SystemClock::new()), options);
    let result = resolver.resolve(document, variables);
    if !result.is_complete {
        tracing::warn!(
            count = result.unresolved_count(),
            unresolved = ?result.unresolved,
            "some markers have no usable value"
        );
    }
    print!("{}", result.resolved);
}

fn pretty_print(
    document: &str,
    syntax: BodySyntax,
    settings: &EditorSettings,
) -> Result<String, CliError> {
    match format::format_document(document, syntax, &settings.indent_unit) {
        FormatOutcome::Formatted(formatted) => Ok(formatted),
        FormatOutcome::Unchanged | FormatOutcome::Unsupported => Ok(document.to_string()),
        FormatOutcome::Invalid => Err(invalid(document, syntax)),
        FormatOutcome::MarkersChanged => Err(CliError::MarkersChanged),
    }
}

fn check(document: &str, syntax: BodySyntax) -> Result<(), CliError> {
    match format::validate(document, syntax) {
        SyntaxStatus::Valid => Ok(()),
        SyntaxStatus::Invalid { message } => Err(CliError::Invalid { syntax, message }),
    }
}

fn invalid(document: &str, syntax: BodySyntax) -> CliError {
    let message = format::validate(document, syntax)
        .message()
        .unwrap_or("does not parse")
        .to_string();
    CliError::Invalid { syntax, message }
}

async fn edit(path: &Path, syntax: BodySyntax, settings: EditorSettings) -> Result<(), CliError> {
    let steps = parse_script(&read(path).await?)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut session = Session::new(settings, syntax, base_dir);
    session.run(&steps).await?;

    let controller = session.controller();
    println!("{}", controller.document());
    println!("---");
    print!(
        "{}",
        to_json_stable(&controller.registry().as_slice()).map_err(CliError::Output)?
    );
    Ok(())
}
