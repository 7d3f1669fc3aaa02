use crate::rewrite::{ContentRewriter, RewriteRuleSet, once_stream};
use crate::upload::Uploader;
use crate::validate::Validator;
use crate::verify::{AvailabilityVerifier, DEFAULT_VERIFY_TIMEOUT, http_client};
use crate::walk::Walker;
use arc_swap::ArcSwap;
use pylon_core::prelude::*;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Opens a bucket for one pass.
pub trait StoreFactory: Send + Sync + 'static {
    type Store: ObjectStore;

    fn connect(&self, config: &PublishConfig) -> Result<Self::Store, StorageError>;
}

impl<F, S> StoreFactory for F
where
    F: Fn(&PublishConfig) -> Result<S, StorageError> + Send + Sync + 'static,
    S: ObjectStore,
{
    type Store = S;

    fn connect(&self, config: &PublishConfig) -> Result<S, StorageError> {
        self(config)
    }
}

/// Runs publishing passes over one asset source.
pub struct Publisher<A: AssetSource, F: StoreFactory> {
    source: A,
    factory: F,
    http: Client,
    allowed_types: Option<Vec<String>>,
    state: Arc<ArcSwap<PublishState>>,
    generation: AtomicU64,
}

impl<A: AssetSource, F: StoreFactory> Publisher<A, F> {
    pub fn new(source: A, factory: F) -> Self {
        Self {
            source,
            factory,
            http: http_client(DEFAULT_VERIFY_TIMEOUT),
            allowed_types: None,
            state: Arc::new(ArcSwap::from_pointee(PublishState::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Client for the read-back requests.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Replaces the default CDN file types.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn state(&self) -> Arc<PublishState> {
        self.state.load_full()
    }

    /// Publishes the whole tree once.
    ///
    /// The state reads not-ready from the first step on and only becomes ready
    /// if every file was published or skipped by validation.
    #[instrument(skip_all, fields(generation))]
    pub async fn publish(&self, config: Arc<PublishConfig>) -> Result<PublishReport, PublishError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);
        self.state.store(Arc::new(PublishState::scanning(generation)));

        info!(root = self.source.root(), "Publishing static assets...");
        let mut report = PublishReport::start();
        match self.run_pass(&config, &mut report).await {
            Ok(()) => {
                let report = report.finish();
                info!(
                    published = report.published.len(),
                    skipped = report.skipped.len(),
                    "Static assets published"
                );
                self.state.store(Arc::new(PublishState::ready(
                    generation,
                    config.cdn_prefix(),
                    report.clone(),
                )));
                Ok(report)
            }
            Err(e) => {
                error!("Publishing failed: {e}");
                self.state.store(Arc::new(PublishState::failed(
                    generation,
                    e.to_string(),
                    Some(report),
                )));
                Err(e)
            }
        }
    }

    async fn run_pass(
        &self,
        config: &PublishConfig,
        report: &mut PublishReport,
    ) -> Result<(), PublishError> {
        config.validate()?;

        let store = self
            .factory
            .connect(config)
            .map_err(|source| PublishError::Connect {
                bucket: config.bucket_name.clone(),
                source,
            })?;

        let validator = match &self.allowed_types {
            Some(types) => Validator::from_config(config).with_allowed_types(types),
            None => Validator::from_config(config),
        };
        let rewriter = ContentRewriter::new(config);
        let uploader = Uploader::new(
            store,
            config.object_key_prefix.clone(),
            AvailabilityVerifier::new(self.http.clone(), config.visit_url_prefix.clone()),
        );

        let mut walker = Walker::new(&self.source);
        while let Some(entry) = walker.next().await {
            let entry = entry?;

            match validator.check(&entry) {
                Ok(()) => {}
                Err(e) if e.is_skippable() => {
                    warn!(path = %entry.relative_path, "Skipping asset: {e}");
                    report.skipped.push(SkippedFile {
                        path: entry.relative_path,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            }

            let unreadable = |source| PublishError::SourceUnreadable {
                path: entry.source_path.clone(),
                source,
            };
            let body = self
                .source
                .open(&entry.source_path)
                .await
                .map_err(unreadable)?;

            let (body, size) = match RewriteRuleSet::for_file_name(&entry.name) {
                Some(rules) => {
                    debug!(path = %entry.relative_path, ?rules, "Rewriting");
                    let data = rewriter
                        .rewrite(rules, body, entry.size)
                        .await
                        .map_err(unreadable)?;
                    let size = data.len() as u64;
                    (once_stream(data), size)
                }
                None => (body, entry.size),
            };

            let object = uploader.publish(&entry.relative_path, body, size).await?;
            report.published.push(object);
        }

        // A prefix with nothing behind it would break every asset link.
        if report.published.is_empty() {
            return Err(PublishError::EmptyBuild {
                root: self.source.root().to_string(),
            });
        }

        Ok(())
    }

    /// Moves the publisher onto its own task.
    ///
    /// Passes run one at a time. Configurations sent while a pass runs are
    /// coalesced, the next pass uses the latest one.
    pub fn spawn(self) -> PublisherHandle {
        let (config_tx, mut config_rx) = watch::channel(ConfigRequest::default());
        let (done_tx, done_rx) = watch::channel(0u64);
        let state = self.state.clone();

        tokio::spawn(async move {
            while config_rx.changed().await.is_ok() {
                let request = config_rx.borrow_and_update().clone();
                if let Some(config) = request.config {
                    // The outcome is logged and kept in the state.
                    let _ = self.publish(config).await;
                }
                done_tx.send_replace(request.id);
            }
            debug!("Publisher stopped");
        });

        PublisherHandle {
            inner: Arc::new(HandleInner {
                config_tx,
                done_rx,
                state,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ConfigRequest {
    id: u64,
    config: Option<Arc<PublishConfig>>,
}

struct HandleInner {
    config_tx: watch::Sender<ConfigRequest>,
    done_rx: watch::Receiver<u64>,
    state: Arc<ArcSwap<PublishState>>,
}

/// Talks to a spawned [`Publisher`]. The worker stops once every handle is gone.
#[derive(Clone)]
pub struct PublisherHandle {
    inner: Arc<HandleInner>,
}

impl PublisherHandle {
    /// Replaces the configuration and schedules a pass without waiting for it.
    ///
    /// Returns a ticket for [`PublisherHandle::wait_for`].
    pub fn update_config(&self, config: PublishConfig) -> u64 {
        let mut id = 0;
        self.inner.config_tx.send_modify(|request| {
            request.id += 1;
            request.config = Some(Arc::new(config));
            id = request.id;
        });
        debug!(request = id, "Publish scheduled");
        id
    }

    /// Waits until a pass has run with configuration `ticket` or a later one.
    pub async fn wait_for(&self, ticket: u64) -> Arc<PublishState> {
        let mut done = self.inner.done_rx.clone();
        if done.wait_for(|served| *served >= ticket).await.is_err() {
            warn!("Publisher stopped before request {ticket} was served");
        }
        self.state()
    }

    pub fn current_config(&self) -> Option<Arc<PublishConfig>> {
        self.inner.config_tx.borrow().config.clone()
    }

    pub fn state(&self) -> Arc<PublishState> {
        self.inner.state.load_full()
    }

    /// The CDN prefix assets should be linked with, empty while not ready.
    pub fn static_prefix(&self) -> String {
        self.state().static_prefix().to_string()
    }
}
