//! CLI Tooling
//!
//! Command-line interface over a local dust directory. Each invocation lists
//! the category a key lives in, runs one command through an [`EditSession`],
//! and renders the result.

use crate::catalog::Catalog;
use crate::channel::StdoutChannel;
use crate::config::{ConfigLoader, EditConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::session::EditSession;
use crate::tooling::format::{format_catalog_table, format_forest_text};
use crate::transport::{split_key, LocalTransport};
use crate::types::Category;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// norns-edit - browse and edit the scripts and data on a norns
#[derive(Parser)]
#[command(name = "norns-edit")]
#[command(about = "Browse, edit, and run scripts in a norns dust directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (where norns-edit.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Dust directory to serve (overrides host.root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the logging flags over the configured logging section
    pub fn apply_log_overrides(&self, logging: &mut LoggingConfig) {
        if self.verbose {
            logging.level = "debug".to_string();
            logging.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a category (or the configured preload categories)
    List {
        /// scripts, data, or audio
        category: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print a resource's content
    Cat { key: String },
    /// Replace a resource's content with a local file
    Write { key: String, file: PathBuf },
    /// Create a new script next to an existing resource
    New {
        sibling: String,
        /// Initial content (default: empty)
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Duplicate a script
    Dup { key: String },
    /// Delete a resource
    Rm { key: String },
    /// Rename a resource within its directory
    Mv { key: String, name: String },
    /// Load and run a script on the host
    Run { key: String },
    /// Show a script catalog file
    Catalog {
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context: configuration, a runtime, and one edit session
pub struct CliContext {
    config: EditConfig,
    root: PathBuf,
    runtime: tokio::runtime::Runtime,
    session: EditSession,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        root_override: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let root = root_override.unwrap_or_else(|| config.host.resolve_root(&workspace_root));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let session = EditSession::new(
            Arc::new(LocalTransport::new(root.clone())),
            Arc::new(StdoutChannel),
        );
        Ok(Self {
            config,
            root,
            runtime,
            session,
        })
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        info!(command = command_name(command), host = %self.config.host.name, "Executing command");
        match command {
            Commands::List { category, format } => {
                let categories = match category {
                    Some(name) => vec![name.parse::<Category>()?],
                    None => self.config.explorer.preload.clone(),
                };
                for category in &categories {
                    self.runtime.block_on(self.session.list(*category))?;
                }
                let view = self.session.view();
                let roots: Vec<_> = view
                    .roots
                    .iter()
                    .filter(|root| categories.contains(&root.category))
                    .cloned()
                    .collect();
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&roots)?)
                } else {
                    Ok(format_forest_text(&roots))
                }
            }
            Commands::Cat { key } => {
                self.load_category_of(key)?;
                let buffer = self.runtime.block_on(self.session.buffer_read(key))?;
                Ok(buffer.content)
            }
            Commands::Write { key, file } => {
                let content = std::fs::read_to_string(file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                self.load_category_of(key)?;
                self.session.buffer_change(key, content.clone());
                self.runtime.block_on(self.session.save(key, content))?;
                Ok(format!("Saved {}", key))
            }
            Commands::New { sibling, from } => {
                let value = match from {
                    Some(path) => std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    None => String::new(),
                };
                self.load_category_of(sibling)?;
                let node = self
                    .runtime
                    .block_on(self.session.script_new(sibling, &value))?;
                Ok(format!("Created {}", node.key))
            }
            Commands::Dup { key } => {
                self.load_category_of(key)?;
                let node = self.runtime.block_on(self.session.script_duplicate(key))?;
                Ok(format!("Duplicated {} -> {}", key, node.key))
            }
            Commands::Rm { key } => {
                self.load_category_of(key)?;
                self.runtime.block_on(self.session.resource_delete(key))?;
                Ok(format!("Deleted {}", key))
            }
            Commands::Mv { key, name } => {
                self.load_category_of(key)?;
                let node = self
                    .session
                    .with_state(|state| state.tree.find(key).cloned())
                    .ok_or_else(|| ApiError::NotFound(key.clone()))?;
                let renamed = self
                    .runtime
                    .block_on(self.session.resource_rename(&node, name, false))?;
                Ok(format!("Renamed {} -> {}", key, renamed.key))
            }
            Commands::Run { key } => {
                self.load_category_of(key)?;
                if !self.session.with_state(|state| state.tree.contains(key)) {
                    return Err(ApiError::NotFound(key.clone()).into());
                }
                self.session.script_run(key)?;
                Ok(format!("Sent run request for {}", key))
            }
            Commands::Catalog { file, format } => {
                let reader = std::fs::File::open(file)
                    .with_context(|| format!("Failed to open {}", file.display()))?;
                let catalog = Catalog::load(std::io::BufReader::new(reader))?;
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&catalog)?)
                } else {
                    Ok(format_catalog_table(&catalog))
                }
            }
        }
    }

    /// List the category `key` belongs to so the tree knows about it
    fn load_category_of(&self, key: &str) -> Result<(), ApiError> {
        let (category, _) = split_key(key)
            .ok_or_else(|| ApiError::NotFound(format!("'{}' is not a resource key", key)))?;
        self.runtime.block_on(self.session.list(category))
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::List { .. } => "list",
        Commands::Cat { .. } => "cat",
        Commands::Write { .. } => "write",
        Commands::New { .. } => "new",
        Commands::Dup { .. } => "dup",
        Commands::Rm { .. } => "rm",
        Commands::Mv { .. } => "mv",
        Commands::Run { .. } => "run",
        Commands::Catalog { .. } => "catalog",
    }
}
