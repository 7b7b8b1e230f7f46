use clap::Parser;
use link_flow::config::{ConfigError, Settings};
use link_flow::engine::{InternalLinker, PageContext, RuleError, RuleStore};
use link_flow::network::NetworkError;
use link_flow::ops::telemetry;
use link_flow::redirect::{RedirectError, RedirectManager, RedirectStore, RequestContext, ServerType};
use link_flow::refinery::{validate_html_with, SchemaAuditor, SchemaValidator, ValidationReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};

mod args;
use args::{Args, Command, LinksCommand, OutArg, RedirectsCommand, RulesArg, SchemaCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error(transparent)]
    Redirect(#[from] RedirectError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// * Outcome of a command that ran to completion
enum Outcome {
    Clean,
    /// Validation found problems; exit non-zero
    Findings,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.pretty_logs {
        telemetry::init_tracing_pretty();
    } else {
        telemetry::init_tracing_with_level(&args.log_level);
    }

    match run(args).await {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Findings) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<Outcome, CliError> {
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    info!(base_url = %settings.base_url, "Settings loaded");

    match args.command {
        Command::Links(command) => run_links(command, &settings).await,
        Command::Redirects(command) => run_redirects(command, &settings).await,
        Command::Schema(command) => run_schema(command, &settings).await,
    }
}

async fn run_links(command: LinksCommand, settings: &Settings) -> Result<Outcome, CliError> {
    match command {
        LinksCommand::Suggest { url, input, rules, out } => {
            let linker = InternalLinker::new(load_link_rules(&rules).await?, settings)?;
            let content = read(&input).await?;
            let suggestions = linker.analyze_content(&content, &url);
            emit(&out, &serde_json::to_string_pretty(&suggestions)?).await?;
        }
        LinksCommand::Rewrite { url, input, markup, rules, out } => {
            let linker = InternalLinker::new(load_link_rules(&rules).await?, settings)?
                .with_markup(markup.into());
            let content = read(&input).await?;
            emit(&out, &linker.apply_internal_links(&content, &url)).await?;
        }
        LinksCommand::Report { pages, rules, out } => {
            let linker = InternalLinker::new(load_link_rules(&rules).await?, settings)?;
            let pages: Vec<PageContext> = serde_json::from_str(&read(&pages).await?)?;
            let report = linker.generate_linking_report(&pages);
            emit(&out, &report.to_json_pretty()).await?;
        }
    }
    Ok(Outcome::Clean)
}

async fn run_redirects(command: RedirectsCommand, settings: &Settings) -> Result<Outcome, CliError> {
    match command {
        RedirectsCommand::Resolve { url, user_agent, referer, headers, rules } => {
            let manager = RedirectManager::new(load_redirects(&rules).await?, settings)?;

            let mut context = RequestContext::new();
            if let Some(ua) = user_agent {
                context = context.with_user_agent(ua);
            }
            if let Some(referer) = referer {
                context = context.with_referer(referer);
            }
            for (name, value) in headers {
                context = context.with_header(&name, value);
            }

            let resolved = manager.find_redirect(&url, Some(&context));
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(Outcome::Clean)
        }
        RedirectsCommand::Validate { rules } => {
            let manager = RedirectManager::new(load_redirects(&rules).await?, settings)?;
            let validation = manager.validate_redirects();
            println!("{}", serde_json::to_string_pretty(&validation)?);
            Ok(if validation.valid { Outcome::Clean } else { Outcome::Findings })
        }
        RedirectsCommand::Export { server, rules, out } => {
            let manager = RedirectManager::new(load_redirects(&rules).await?, settings)?;
            let server: ServerType = server.into();
            match &out.out {
                Some(path) => manager.write_server_config(path, server).await?,
                None => println!("{}", manager.generate_server_config(server)?),
            }
            Ok(Outcome::Clean)
        }
    }
}

async fn run_schema(command: SchemaCommand, settings: &Settings) -> Result<Outcome, CliError> {
    let SchemaCommand::Validate { urls, html, out } = command;

    let report = match html {
        Some(path) => {
            let contents = read(&path).await?;
            let page = validate_html_with(&SchemaValidator::new(), &path.display().to_string(), &contents);
            ValidationReport::from_results(vec![page], Vec::new())
        }
        None => {
            let auditor = SchemaAuditor::new(&settings.fetch)?;
            auditor.generate_validation_report(&urls).await
        }
    };

    emit(&out, &report.to_json_pretty()).await?;
    let clean = !report.has_errors() && report.failed_urls.is_empty();
    Ok(if clean { Outcome::Clean } else { Outcome::Findings })
}

async fn load_link_rules(arg: &RulesArg) -> Result<RuleStore, CliError> {
    match &arg.rules {
        Some(path) => Ok(RuleStore::from_json_str(&read(path).await?)?),
        None => Ok(RuleStore::with_defaults()),
    }
}

async fn load_redirects(arg: &RulesArg) -> Result<RedirectStore, CliError> {
    match &arg.rules {
        Some(path) => Ok(RedirectStore::from_json_str(&read(path).await?)?),
        None => Ok(RedirectStore::with_defaults()),
    }
}

async fn read(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path).await.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn emit(out: &OutArg, contents: &str) -> Result<(), CliError> {
    match &out.out {
        Some(path) => {
            tokio::fs::write(path, contents).await?;
            info!(path = %path.display(), bytes = contents.len(), "Output written");
        }
        None => println!("{}", contents),
    }
    Ok(())
}
