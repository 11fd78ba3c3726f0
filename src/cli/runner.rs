//! CLI runner - executes commands

use crate::catalog::{list_builtin_info, load_catalog, Catalog, CatalogDefinition};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{IterateConfig, Order};
use crate::error::{Error, Result};
use crate::http::redact::redact_text;
use crate::stream::RecordStream;
use crate::types::StringMap;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

/// Options of the `read` command
struct ReadArgs<'a> {
    path: &'a str,
    locator: &'a str,
    config: IterateConfig,
    auth: StringMap,
    params: StringMap,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List => self.list_catalogs(),
            Commands::Sources => self.sources(),
            Commands::Validate => self.validate(),
            Commands::Read {
                path,
                locator,
                count,
                page_size,
                order,
                skip_inner_errors,
                tag_parent,
                resume_pages,
                auth,
                params,
            } => {
                let config = IterateConfig::new()
                    .with_count(*count)
                    .with_page_size(*page_size)
                    .with_order(*order)
                    .with_skip_inner_errors(*skip_inner_errors)
                    .with_tag_parent(*tag_parent)
                    .with_resume_pages(*resume_pages);
                self.read(ReadArgs {
                    path,
                    locator,
                    config,
                    auth: parse_pairs(auth)?,
                    params: parse_pairs(params)?,
                })
                .await
            }
        }
    }

    /// Load catalog definition
    fn load_catalog(&self) -> Result<CatalogDefinition> {
        let name = self
            .cli
            .catalog
            .as_ref()
            .ok_or_else(|| Error::config("Catalog not specified (use -c flag)"))?;
        load_catalog(name)
    }

    /// List built-in catalogs
    fn list_catalogs(&self) -> Result<()> {
        let catalogs: Vec<Value> = list_builtin_info()
            .into_iter()
            .map(|info| {
                json!({
                    "name": info.name,
                    "description": info.description,
                    "aliases": info.aliases,
                    "auth": info.auth
                })
            })
            .collect();

        self.output_message(&json!({ "catalogs": catalogs }));
        Ok(())
    }

    /// List sources with their children
    fn sources(&self) -> Result<()> {
        let catalog = self.load_catalog()?;

        let sources: Vec<Value> = catalog
            .sources
            .iter()
            .map(|source| {
                let children: Vec<Value> = source
                    .children
                    .iter()
                    .map(|child| json!({ "name": child.name, "source": child.source }))
                    .collect();
                json!({
                    "name": source.name,
                    "description": source.description,
                    "tree": source.is_tree(),
                    "children": children
                })
            })
            .collect();

        self.output_message(&json!({ "catalog": catalog.name, "sources": sources }));
        Ok(())
    }

    /// Validate catalog definition
    fn validate(&self) -> Result<()> {
        let catalog = self.load_catalog()?;

        info!(
            "Catalog '{}' is valid with {} sources",
            catalog.name,
            catalog.sources.len()
        );
        self.output_message(&json!({
            "catalog": catalog.name,
            "valid": true,
            "sources": catalog.sources.len()
        }));
        Ok(())
    }

    /// Stream records of a traversal path
    async fn read(&self, args: ReadArgs<'_>) -> Result<()> {
        let catalog = Catalog::new(self.load_catalog()?)?
            .with_auth(args.auth)
            .with_params(args.params);

        let path: Vec<&str> = args.path.split('/').filter(|s| !s.is_empty()).collect();
        let started = Instant::now();
        let mut stream = catalog.iterate(&path, args.locator, &args.config).await?;

        let mut records = 0usize;
        loop {
            match stream.next().await {
                Ok(Some(record)) => {
                    self.output_message(&record);
                    records += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    let pages = stream.pages_consumed();
                    error!(
                        "Read of {} failed after {} records: {}",
                        args.path,
                        records,
                        redact_text(&e.to_string())
                    );
                    error!(
                        "{} pages of '{}' were consumed; rerun with --resume-pages {pages} to continue",
                        pages,
                        path.first().copied().unwrap_or_default()
                    );
                    return Err(e);
                }
            }
        }

        let order = match args.config.order {
            Order::Natural => "natural",
            Order::Reverse => "reverse",
        };
        info!(
            "Read {} records from {} ({} order, {} pages) in {:?}",
            records,
            args.path,
            order,
            stream.pages_fetched(),
            started.elapsed()
        );
        Ok(())
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Parse repeated `key=value` arguments
pub fn parse_pairs(pairs: &[String]) -> Result<StringMap> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::invalid_value(pair.as_str(), "expected KEY=VALUE")
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::invalid_value(pair.as_str(), "key cannot be empty"));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}
