//! ngxconf - print nginx configuration with includes expanded
//!
//! This is the main entry point for the ngxconf CLI.

use anyhow::Context;
use clap::Parser;
use ngxconf_config::{
    dumps, filter_only, filter_out, load_with_includes, DualView, Error, IncludeOptions, SyntaxError,
    PROVENANCE_TAG,
};
use ngxconf_core::{FsResolver, DEFAULT_CONFIG_PATH};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives kept by `--minimal`
const MINIMAL_TAGS: [&str; 8] = [
    "http",
    "server",
    "location",
    "listen",
    "if",
    "server_name",
    "root",
    "proxy_pass",
];

/// Directives dropped by `--skip-dummy`
const DUMMY_TAGS: [&str; 3] = ["types", "load_module", "events"];

/// Parse nginx config with its includes, optionally filter it and print it back
#[derive(Parser)]
#[command(name = "ngxconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Strip comments from output
    #[arg(short = 'c', long)]
    skip_comments: bool,

    /// Show paths to loaded configuration files
    #[arg(short, long)]
    structure: bool,

    /// Show only listen/server_name/root/proxy_pass and their enclosing blocks
    #[arg(short, long)]
    minimal: bool,

    /// Skip types/events/load_module (ignored with --minimal)
    #[arg(short = 'd', long)]
    skip_dummy: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Main configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    path: PathBuf,
}

impl Cli {
    /// Run the tag filters selected by the flags
    fn apply_filters(&self, doc: &DualView) -> ngxconf_config::Result<DualView> {
        if self.minimal {
            let mut tags = MINIMAL_TAGS.to_vec();
            if self.structure {
                tags.push(PROVENANCE_TAG);
            }
            if !self.skip_comments {
                tags.push("#");
            }
            return filter_only(doc, &tags);
        }

        let mut tags = Vec::new();
        if !self.structure {
            tags.push(PROVENANCE_TAG);
        }
        if self.skip_comments {
            tags.push("#");
        }
        if self.skip_dummy {
            tags.extend(DUMMY_TAGS);
        }

        if tags.is_empty() {
            return Ok(doc.clone());
        }
        filter_out(doc, &tags)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::debug!("Loading configuration from {}", cli.path.display());

    let doc = match load_with_includes(&cli.path, &FsResolver, IncludeOptions::default()) {
        Ok(doc) => doc,
        Err(Error::Syntax(e)) => {
            report_syntax_error(&e, &cli.path);
            std::process::exit(1);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to load {}", cli.path.display())),
    };

    let doc = cli.apply_filters(&doc).context("Failed to filter configuration")?;
    println!("{}", dumps(&doc));
    Ok(())
}

/// Print an annotated snippet of the file the error points into
fn report_syntax_error(err: &SyntaxError, root: &Path) {
    let file = err.file.as_deref().unwrap_or(root);
    match std::fs::read_to_string(file) {
        Ok(source) => eprint!("{}", err.report(&file.display().to_string(), &source)),
        Err(_) => eprintln!("{err}"),
    }
}
