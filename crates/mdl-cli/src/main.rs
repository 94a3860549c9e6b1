//! mdl-index: compile MDL schemas into retrieval documents.
//!
//! Commands: compile, views, index, count, describe

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use mdl_core::{validate, CompiledDocument, MdlError};
use mdl_pipeline::semantics::{DescriptionGenerator, DescriptionRequest, SemanticsDescription};
use mdl_pipeline::{IndexConfig, Indexer};
use mdl_store::{DocumentStore, HashEmbedder, SqliteStore};

#[derive(Parser)]
#[command(name = "mdl-index")]
#[command(version)]
#[command(about = "Compile MDL schemas into DDL retrieval documents")]
struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the DDL documents an MDL compiles to
    Compile {
        /// MDL JSON file
        file: PathBuf,
    },
    /// Print the view-question documents of an MDL
    Views {
        /// MDL JSON file
        file: PathBuf,
    },
    /// Replace the indexed documents with those compiled from an MDL
    Index {
        /// MDL JSON file
        file: PathBuf,
        /// Configuration file
        #[arg(long, default_value = "mdl-index.toml")]
        config: PathBuf,
    },
    /// Count documents in each collection
    Count {
        /// Configuration file
        #[arg(long, default_value = "mdl-index.toml")]
        config: PathBuf,
    },
    /// Apply a recorded description reply to an MDL and print the result
    Describe {
        /// MDL JSON file
        file: PathBuf,
        /// Comma-separated model names to describe
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,
        /// File holding the generator's JSON reply
        #[arg(long)]
        reply: PathBuf,
        /// What the data is for
        #[arg(long, default_value = "")]
        prompt: String,
        /// Language of the descriptions
        #[arg(long, default_value = mdl_pipeline::semantics::DEFAULT_LANGUAGE)]
        language: String,
    },
}

#[derive(Serialize)]
struct Counts {
    ddl_collection: String,
    ddl_documents: usize,
    view_collection: String,
    view_documents: usize,
}

/// Generator that answers with a reply recorded earlier.
struct RecordedReply(String);

impl DescriptionGenerator for RecordedReply {
    fn generate(
        &self,
        _system_prompt: &str,
        _prompt: &str,
    ) -> impl Future<Output = Result<String, MdlError>> + Send {
        let reply = self.0.clone();
        async move { Ok(reply) }
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<IndexConfig> {
    Ok(IndexConfig::load(path)?.with_env()?)
}

fn open_stores(config: &IndexConfig) -> anyhow::Result<(SqliteStore, SqliteStore)> {
    let path = config.store_path(&std::env::current_dir()?);
    let ddl = SqliteStore::open(&path, &config.store.ddl_collection)?;
    let views = SqliteStore::open(&path, &config.store.view_collection)?;
    Ok((ddl, views))
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { file } => {
            let mdl = validate(&read(&file)?)?;
            let documents: Vec<CompiledDocument> = mdl_compiler::compile_ddl(&mdl)?;
            print_json(&documents)?;
        }
        Commands::Views { file } => {
            let mdl = validate(&read(&file)?)?;
            print_json(&mdl_compiler::project_views(&mdl.views)?)?;
        }
        Commands::Index { file, config } => {
            let config = load_config(&config)?;
            let (ddl, views) = open_stores(&config)?;
            let embedder = HashEmbedder::new(config.embedding.dimensions);
            let mut indexer = Indexer::new(embedder, ddl, views).with_sync_mode(config.sync.mode);
            let report = indexer.run(&read(&file)?).await?;
            print_json(&report)?;
        }
        Commands::Count { config } => {
            let config = load_config(&config)?;
            let (ddl, views) = open_stores(&config)?;
            print_json(&Counts {
                ddl_collection: ddl.collection().to_string(),
                ddl_documents: ddl.count_documents()?,
                view_collection: views.collection().to_string(),
                view_documents: views.count_documents()?,
            })?;
        }
        Commands::Describe {
            file,
            models,
            reply,
            prompt,
            language,
        } => {
            let mut mdl = validate(&read(&file)?)?;
            let step = SemanticsDescription::new(RecordedReply(read(&reply)?));
            let request = DescriptionRequest::new(&mdl, &models, &prompt).language(&language);
            let descriptions = step.run(&request).await?;
            let updated = mdl_pipeline::semantics::apply_descriptions(&mut mdl, &descriptions);
            tracing::info!(updated, "applied descriptions");
            print_json(&mdl)?;
        }
    }

    Ok(())
}
