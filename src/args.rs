use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use link_flow::engine::LinkMarkup;
use link_flow::redirect::ServerType;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "link-flow")]
#[command(about = "Internal linking, redirect and structured-data tooling for content sites")]
#[command(version)]
pub struct Args {
    /// Settings file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Human-readable logs instead of JSON
    #[arg(long, global = true)]
    pub pretty_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Internal-link suggestions, rewriting and site reports
    #[command(subcommand)]
    Links(LinksCommand),

    /// Redirect resolution, validation and server config export
    #[command(subcommand)]
    Redirects(RedirectsCommand),

    /// Structured-data validation
    #[command(subcommand)]
    Schema(SchemaCommand),
}

#[derive(ClapArgs, Debug)]
pub struct RulesArg {
    /// Rule file (JSON array); the default rule set is used when omitted
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct OutArg {
    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum LinksCommand {
    /// Print ranked link suggestions for one page
    Suggest {
        /// URL of the page the content belongs to
        #[arg(long)]
        url: String,
        /// File with the page content
        input: PathBuf,
        #[command(flatten)]
        rules: RulesArg,
        #[command(flatten)]
        out: OutArg,
    },

    /// Rewrite page content with internal links applied
    Rewrite {
        #[arg(long)]
        url: String,
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = MarkupArg::Html)]
        markup: MarkupArg,
        #[command(flatten)]
        rules: RulesArg,
        #[command(flatten)]
        out: OutArg,
    },

    /// Site-wide linking report from a JSON array of pages
    Report {
        /// JSON array of {url, content, title?, page_type?}
        pages: PathBuf,
        #[command(flatten)]
        rules: RulesArg,
        #[command(flatten)]
        out: OutArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum RedirectsCommand {
    /// Resolve one URL against the redirect rules
    Resolve {
        url: String,
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long)]
        referer: Option<String>,
        /// Request header as name=value (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        #[command(flatten)]
        rules: RulesArg,
    },

    /// Check the rules for loops, long chains and invalid destinations
    Validate {
        #[command(flatten)]
        rules: RulesArg,
    },

    /// Export the rules as a web-server config
    Export {
        #[arg(long, value_enum)]
        server: ServerArg,
        #[command(flatten)]
        rules: RulesArg,
        #[command(flatten)]
        out: OutArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Fetch URLs and validate their structured data
    Validate {
        #[arg(required_unless_present = "html")]
        urls: Vec<String>,
        /// Validate a local HTML file instead of fetching
        #[arg(long, conflicts_with = "urls")]
        html: Option<PathBuf>,
        #[command(flatten)]
        out: OutArg,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MarkupArg {
    Html,
    Markdown,
}

impl From<MarkupArg> for LinkMarkup {
    fn from(arg: MarkupArg) -> Self {
        match arg {
            MarkupArg::Html => LinkMarkup::Html,
            MarkupArg::Markdown => LinkMarkup::Markdown,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServerArg {
    Nginx,
    Apache,
    Vercel,
    Netlify,
}

impl From<ServerArg> for ServerType {
    fn from(arg: ServerArg) -> Self {
        match arg {
            ServerArg::Nginx => ServerType::Nginx,
            ServerArg::Apache => ServerType::Apache,
            ServerArg::Vercel => ServerType::Vercel,
            ServerArg::Netlify => ServerType::Netlify,
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}
