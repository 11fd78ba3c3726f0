//! Building record streams from a catalog
//!
//! A traversal path names a source followed by child names:
//! `["page_feed", "comments", "replies"]`. The first source becomes the
//! outer stream; every following level is a [`ChainedIterator`] whose inner
//! streams are opened per parent record. All levels share one executor, so
//! two failed requests in a row anywhere in the traversal stop it.

use super::parser::{load_catalog, parse_catalog};
use super::types::{CatalogDefinition, SourceDefinition};
use crate::chain::ChainedIterator;
use crate::config::{IterateConfig, Order};
use crate::error::{Error, Result};
use crate::expand::{DeferredExpansion, ListingTree};
use crate::http::{
    ExecutorConfig, HttpTransport, PageRequest, RequestPacer, RetryingExecutor, Transport,
    TransportConfig,
};
use crate::pagination::SourcePaginator;
use crate::stream::BoxedRecordStream;
use crate::template::{self, TemplateContext};
use crate::types::StringMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A catalog bound to a transport and credentials
pub struct Catalog {
    definition: CatalogDefinition,
    transport: Arc<dyn Transport>,
    auth: StringMap,
    params: StringMap,
}

impl Catalog {
    /// Create a catalog talking HTTP to its base URL
    pub fn new(definition: CatalogDefinition) -> Result<Self> {
        let mut config = TransportConfig::builder().base_url(&definition.base_url);
        if let Some(secs) = definition.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        let transport = HttpTransport::new(config.build())?;
        Ok(Self::with_transport(definition, Arc::new(transport)))
    }

    /// Create a catalog over any transport
    pub fn with_transport(definition: CatalogDefinition, transport: Arc<dyn Transport>) -> Self {
        Self {
            definition,
            transport,
            auth: StringMap::new(),
            params: StringMap::new(),
        }
    }

    /// Parse, validate and bind a YAML catalog
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::new(parse_catalog(yaml)?)
    }

    /// Load a built-in catalog by name, or a YAML file
    pub fn load(name_or_path: impl AsRef<Path>) -> Result<Self> {
        Self::new(load_catalog(name_or_path)?)
    }

    /// Add a credential (`{{ auth.<key> }}`)
    #[must_use]
    pub fn auth(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth.insert(key.into(), value.into());
        self
    }

    /// Add several credentials
    #[must_use]
    pub fn with_auth(mut self, auth: StringMap) -> Self {
        self.auth.extend(auth);
        self
    }

    /// Add a caller parameter (`{{ param.<key> }}`)
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add several caller parameters
    #[must_use]
    pub fn with_params(mut self, params: StringMap) -> Self {
        self.params.extend(params);
        self
    }

    /// The parsed definition
    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    /// Catalog name
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Retry settings, with the catalog's overrides applied
    pub fn executor_config(&self) -> ExecutorConfig {
        let mut builder = ExecutorConfig::builder();
        if let Some(retries) = self.definition.num_retries {
            builder = builder.num_retries(retries);
        }
        if let Some(ms) = self.definition.retry_rate_ms {
            builder = builder.retry_rate(Duration::from_millis(ms));
        }
        builder.build()
    }

    /// Open a traversal
    ///
    /// `path` starts with a source name; each following entry names a child
    /// of the previous level. `locator` fills `{{ locator }}` of the first
    /// source; deeper levels get the key of their parent record.
    pub async fn iterate(
        &self,
        path: &[&str],
        locator: &str,
        config: &IterateConfig,
    ) -> Result<BoxedRecordStream> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| Error::config("Traversal path cannot be empty"))?;
        let root = self.definition.source(first)?;

        let mut levels = Vec::with_capacity(rest.len());
        let mut parent = root;
        for name in rest {
            let child = parent.child(name)?;
            let source = self.definition.source(&child.source)?;
            levels.push(Level {
                key: child.key.clone(),
                source: source.clone(),
            });
            parent = source;
        }

        let mut context = TemplateContext::with_locator(locator);
        context.set_auth(self.auth.clone()).set_params(self.params.clone());

        let opener = SourceOpener {
            executor: Arc::new(RetryingExecutor::with_config(
                self.transport.clone(),
                self.executor_config(),
            )),
            shared_params: self.definition.params.clone(),
            headers: self.definition.headers.clone(),
            request_rate: Duration::from_millis(self.definition.request_rate_ms),
            context,
        };

        info!(
            "Reading {}/{} for {}",
            self.definition.name,
            path.join("/"),
            locator
        );

        if levels.is_empty() {
            return opener.open_outer(root, config).await;
        }

        let outer_config = IterateConfig {
            count: 0,
            ..config.clone()
        };
        let outer = opener.open_outer(root, &outer_config).await?;
        let first_key = levels[0].key.clone();
        let plan = Arc::new(ChildPlan {
            opener,
            levels,
            config: config.for_child(),
        });

        Ok(Box::new(
            ChainedIterator::new(
                outer,
                first_key,
                Box::new(open_child),
                ChildArgs { plan, depth: 0 },
            )
            .configure(config),
        ))
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("name", &self.definition.name)
            .field("sources", &self.definition.source_names())
            .finish_non_exhaustive()
    }
}

/// Open a single source over a transport, without catalog-level settings
pub async fn iterate(
    transport: Arc<dyn Transport>,
    source: &SourceDefinition,
    locator: &str,
    config: &IterateConfig,
) -> Result<BoxedRecordStream> {
    let opener = SourceOpener {
        executor: Arc::new(RetryingExecutor::new(transport)),
        shared_params: StringMap::new(),
        headers: StringMap::new(),
        request_rate: Duration::ZERO,
        context: TemplateContext::with_locator(locator),
    };
    opener.open_outer(source, config).await
}

// ============================================================================
// Stream Construction
// ============================================================================

/// One chained level of a traversal
struct Level {
    key: String,
    source: SourceDefinition,
}

/// Everything a child factory needs, shared by all levels
struct ChildPlan {
    opener: SourceOpener,
    levels: Vec<Level>,
    config: IterateConfig,
}

struct ChildArgs {
    plan: Arc<ChildPlan>,
    depth: usize,
}

/// Open the stream of one parent record at `args.depth`
fn open_child(key: &str, args: &ChildArgs) -> Result<BoxedRecordStream> {
    let plan = &args.plan;
    let level = plan
        .levels
        .get(args.depth)
        .ok_or_else(|| Error::Other(format!("no traversal level {}", args.depth)))?;

    let context = plan.opener.context.for_locator(key);
    let stream = plan.opener.open(&level.source, &context, &plan.config)?;

    match plan.levels.get(args.depth + 1) {
        None => Ok(stream),
        Some(next) => Ok(Box::new(
            ChainedIterator::new(
                stream,
                next.key.clone(),
                Box::new(open_child),
                ChildArgs {
                    plan: plan.clone(),
                    depth: args.depth + 1,
                },
            )
            .configure(&plan.config),
        )),
    }
}

/// Turns source definitions into record streams
struct SourceOpener {
    executor: Arc<RetryingExecutor>,
    shared_params: StringMap,
    headers: StringMap,
    request_rate: Duration,
    context: TemplateContext,
}

impl SourceOpener {
    fn request(
        &self,
        source: &SourceDefinition,
        context: &TemplateContext,
        config: &IterateConfig,
    ) -> Result<PageRequest> {
        let mut request = PageRequest::new(template::render(&source.path, context)?)
            .with_params(&template::render_map(&self.shared_params, context)?)
            .with_params(&template::render_map(&source.params, context)?);
        request.headers = template::render_map(&self.headers, context)?;

        if let Some(page_size) = &source.page_size {
            if let Some(size) = page_size.resolve(config.page_size) {
                request = request.query(&page_size.param, size.to_string());
            }
        }

        if let Some(order) = &source.order {
            let value = match config.order {
                Order::Natural => &order.natural,
                Order::Reverse => &order.reverse,
            };
            request = request.query(&order.param, value);
        }

        Ok(request)
    }

    fn paginator(
        &self,
        source: &SourceDefinition,
        context: &TemplateContext,
        config: &IterateConfig,
    ) -> Result<SourcePaginator> {
        // An order parameter already reverses the source
        let order = if source.order.is_some() {
            Order::Natural
        } else {
            config.order
        };

        Ok(SourcePaginator::new(
            self.executor.clone(),
            self.request(source, context, config)?,
            source.pagination.build(order),
        )
        .records_path(&source.records_path)
        .max_count(config.count)
        .pacer(RequestPacer::new(self.request_rate)))
    }

    fn open(
        &self,
        source: &SourceDefinition,
        context: &TemplateContext,
        config: &IterateConfig,
    ) -> Result<BoxedRecordStream> {
        let Some(tree) = &source.tree else {
            return Ok(Box::new(self.paginator(source, context, config)?));
        };

        let adapter = ListingTree::new(tree.clone(), self.request(source, context, config)?)
            .shared_params(&template::render_map(&self.shared_params, context)?);

        Ok(Box::new(
            DeferredExpansion::new(adapter, self.executor.clone())
                .chunk_size(tree.chunk_size)
                .pacer(RequestPacer::new(self.request_rate))
                .configure(config),
        ))
    }

    /// Open the outermost source, skipping `resume_pages` pages
    async fn open_outer(
        &self,
        source: &SourceDefinition,
        config: &IterateConfig,
    ) -> Result<BoxedRecordStream> {
        if config.resume_pages == 0 {
            return self.open(source, &self.context, config);
        }
        if source.is_tree() {
            warn!("Source '{}' is a tree and cannot be resumed, starting over", source.name);
            return self.open(source, &self.context, config);
        }

        let mut paginator = self.paginator(source, &self.context, config)?;
        paginator.jump(config.resume_pages).await?;
        info!(
            "Resumed '{}' after {} pages",
            source.name,
            paginator.page_count()
        );
        Ok(Box::new(paginator))
    }
}
