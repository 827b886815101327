//! panlink CLI - Command-line interface
//!
//! Usage:
//!   panlink extract <path>
//!   panlink view
//!   panlink validate

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use panlink_core::{AppConfig, OutputFormat};
use panlink_extractor::ExtractionPipeline;
use panlink_parser::DocumentSource;
use panlink_report::{store_for, IdentifierValidation, Report, RunSummary};

#[derive(Parser)]
#[command(name = "panlink")]
#[command(about = "Identifier, entity and relation extraction from documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for result files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Table format (csv or json)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract identifiers, entities and relations from a document
    Extract {
        /// Path to a PDF or text document
        path: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// NER inference endpoint (overrides config)
        #[arg(long)]
        tagger_url: Option<String>,

        /// Run regex-only, without the NER tagger
        #[arg(long, conflicts_with = "tagger_url")]
        no_tagger: bool,
    },
    /// Show stored extraction results
    View {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-validate stored identifiers against the identifier format
    Validate {
        #[command(flatten)]
        output: OutputArgs,
    },
}

impl OutputArgs {
    /// Config file (or environment) with command-line overrides applied
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?.with_env_override()?,
            None => AppConfig::from_env()?,
        };

        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }

        Ok(config)
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_str().into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            path,
            output,
            tagger_url,
            no_tagger,
        } => {
            let mut config = output.load_config()?;
            if let Some(url) = tagger_url {
                config.tagger.endpoint = Some(url);
                config.tagger.enabled = true;
            }
            if no_tagger {
                config.tagger.enabled = false;
            }
            init_tracing(&config);

            if !path.exists() {
                bail!("Input file not found: {}", path.display());
            }

            tracing::info!("Extracting entities from {}", path.display());
            let source = DocumentSource::new(&path);
            let mut pipeline = ExtractionPipeline::from_config(&config).await?;
            let artifacts = pipeline
                .run(&source)
                .await
                .with_context(|| format!("Failed to extract from {}", path.display()))?;

            println!("{}", RunSummary::from_artifacts(&artifacts));

            let store = store_for(&config.output);
            let written = store.save(&artifacts)?;

            println!("Results written to {}:", store.dir().display());
            for file in written {
                println!("   - {}", file.display());
            }
        }
        Commands::View { output } => {
            let config = output.load_config()?;
            init_tracing(&config);

            let results = store_for(&config.output).load()?;
            println!("{}", Report::new(results));
        }
        Commands::Validate { output } => {
            let config = output.load_config()?;
            init_tracing(&config);

            let results = store_for(&config.output).load()?;
            println!("{}", IdentifierValidation::run(&results.entities)?);
        }
    }

    Ok(())
}
