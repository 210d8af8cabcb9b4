//! Pagination controller for the remote feed.
//!
//! Owns the accumulated item list and the paging flags. At most one page
//! request is in flight: starting a new one aborts the previous task and bumps
//! a generation counter, and any result carrying an older generation is
//! dropped without touching state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use super::cache::FeedCache;
use super::client::{FeedClient, FeedPage};
use crate::config::FeedConfig;
use crate::error::{GalleryError, Result};
use crate::models::ImageItem;
use crate::viewer::MoreItems;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Checking,
    Online,
    Offline,
}

/// What a load call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and applied; `added` counts new unique items.
    Fetched { page: u32, added: usize },
    /// Served from the feed cache without a request.
    Cached { page: u32 },
    /// Nothing to do (already loading, or no more pages).
    Skipped,
    /// Superseded by a newer request or cancelled; state untouched.
    Cancelled,
    /// The request failed; flags cleared, items kept.
    Failed,
}

/// Immutable copy of the controller state for rendering.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub items: Vec<ImageItem>,
    pub current_page: u32,
    pub has_more: bool,
    pub server_status: ServerStatus,
    pub loading: bool,
    pub loading_more: bool,
    pub last_error: Option<String>,
}

struct FeedState {
    items: Vec<ImageItem>,
    names: HashSet<String>,
    current_page: u32,
    has_more: bool,
    server_status: ServerStatus,
    loading: bool,
    loading_more: bool,
    cache: Option<FeedCache>,
    generation: u64,
    in_flight: Option<AbortHandle>,
    last_error: Option<String>,
}

impl FeedState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            names: HashSet::new(),
            current_page: 1,
            has_more: true,
            server_status: ServerStatus::Checking,
            loading: true,
            loading_more: false,
            cache: None,
            generation: 0,
            in_flight: None,
            last_error: None,
        }
    }

    fn replace_items(&mut self, items: Vec<ImageItem>) {
        self.names.clear();
        self.items.clear();
        self.append_unique(items);
    }

    /// Appends items whose name is not already present. Returns how many were added.
    fn append_unique(&mut self, items: Vec<ImageItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.names.insert(item.name.clone()) {
                self.items.push(item);
            } else {
                trace!(name = %item.name, "Dropping duplicate feed item");
            }
        }
        self.items.len() - before
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            debug!(generation = self.generation, "Aborted in-flight feed request");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Page { page: u32, initial: bool },
    More,
}

enum Start {
    Done(LoadOutcome),
    Spawned {
        page: u32,
        initial: bool,
        generation: u64,
        handle: JoinHandle<Result<FeedPage>>,
    },
}

struct Inner<C> {
    client: Arc<C>,
    config: FeedConfig,
    state: Mutex<FeedState>,
}

impl<C> Drop for Inner<C> {
    fn drop(&mut self) {
        self.state.get_mut().abort_in_flight();
    }
}

/// Cheaply cloneable handle; clones share the same state.
pub struct FeedController<C: FeedClient> {
    inner: Arc<Inner<C>>,
}

impl<C: FeedClient> Clone for FeedController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: FeedClient> FeedController<C> {
    pub fn new(client: C, config: FeedConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: Arc::new(client),
                config,
                state: Mutex::new(FeedState::new()),
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    /// Probes page 1. On success marks the server online and performs the
    /// initial load; on any failure marks it offline. Safe to call repeatedly.
    pub async fn check_connection(&self) -> ServerStatus {
        self.inner.state.lock().server_status = ServerStatus::Checking;

        let probe = fetch_with_timeout(Arc::clone(&self.inner.client), 1, &self.inner.config).await;
        match probe {
            Ok(_) => {
                info!(base = %self.inner.config.base_url, "Image server online");
                self.inner.state.lock().server_status = ServerStatus::Online;
                self.load_initial().await;
                ServerStatus::Online
            }
            Err(e) => {
                warn!(error = %e, "Image server unreachable");
                let mut state = self.inner.state.lock();
                state.server_status = ServerStatus::Offline;
                state.loading = false;
                state.last_error = Some(e.to_string());
                ServerStatus::Offline
            }
        }
    }

    /// Loads page 1, replacing the current items. Never served from cache.
    pub async fn load_initial(&self) -> LoadOutcome {
        self.load_page(1, true).await
    }

    /// Loads the page after the current one. No-op while a page is already
    /// loading or after the last page was seen.
    pub async fn load_more(&self) -> LoadOutcome {
        self.run(Request::More).await
    }

    /// Drops the cache and reloads from page 1.
    pub async fn refresh(&self) -> LoadOutcome {
        {
            let mut state = self.inner.state.lock();
            state.current_page = 1;
            state.has_more = true;
            state.cache = None;
        }
        self.load_page(1, true).await
    }

    /// Loads `page`. An initial load replaces the items; otherwise the page is
    /// appended, or served from the cache when a fresh snapshot covers it.
    pub async fn load_page(&self, page: u32, initial: bool) -> LoadOutcome {
        self.run(Request::Page { page, initial }).await
    }

    /// Aborts any in-flight request and clears the loading flags.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.abort_in_flight();
        state.generation += 1;
        state.loading = false;
        state.loading_more = false;
    }

    pub async fn fetch_stats(&self) -> Result<super::FeedStats> {
        self.inner.client.fetch_stats().await
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.inner.state.lock();
        FeedSnapshot {
            items: state.items.clone(),
            current_page: state.current_page,
            has_more: state.has_more,
            server_status: state.server_status,
            loading: state.loading,
            loading_more: state.loading_more,
            last_error: state.last_error.clone(),
        }
    }

    /// Runs `f` against the current items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[ImageItem]) -> R) -> R {
        f(&self.inner.state.lock().items)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().has_more
    }

    pub fn server_status(&self) -> ServerStatus {
        self.inner.state.lock().server_status
    }

    /// Spawns a background task that serves viewer prefetch requests.
    /// The task exits once every returned handle is dropped.
    pub fn spawn_prefetcher(&self) -> PrefetchHandle {
        let (tx, rx) = flume::unbounded::<PrefetchMessage>();
        let controller = self.clone();

        tokio::spawn(async move {
            debug!("Prefetch worker started");
            while let Ok(message) = rx.recv_async().await {
                // Collapse a burst of requests into one load.
                let mut wants_more = message == PrefetchMessage::More;
                let mut cancel = message == PrefetchMessage::Cancel;
                while let Ok(next) = rx.try_recv() {
                    match next {
                        PrefetchMessage::More => wants_more = true,
                        PrefetchMessage::Cancel => {
                            cancel = true;
                            wants_more = false;
                        }
                    }
                }

                if cancel {
                    controller.cancel();
                }
                if wants_more {
                    let outcome = controller.load_more().await;
                    trace!(?outcome, "Prefetch finished");
                }
            }
            debug!("Prefetch worker stopped");
        });

        let controller = self.clone();
        PrefetchHandle {
            tx,
            cancel: Arc::new(move || controller.cancel()),
        }
    }

    async fn run(&self, request: Request) -> LoadOutcome {
        match self.start(request) {
            Start::Done(outcome) => outcome,
            Start::Spawned {
                page,
                initial,
                generation,
                handle,
            } => {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) if e.is_cancelled() => Err(GalleryError::Cancelled),
                    Err(e) => {
                        error!(page, error = %e, "Feed fetch task panicked");
                        Err(GalleryError::Task(e.to_string()))
                    }
                };
                self.finish(page, initial, generation, result)
            }
        }
    }

    /// Decides what a request does and, if it needs the network, spawns the
    /// fetch. Runs entirely under the state lock.
    fn start(&self, request: Request) -> Start {
        let mut state = self.inner.state.lock();

        let (page, initial) = match request {
            Request::Page { page, initial } => (page.max(1), initial),
            Request::More => {
                if state.loading_more || state.loading || !state.has_more {
                    trace!(
                        loading_more = state.loading_more,
                        has_more = state.has_more,
                        "Skipping load_more"
                    );
                    return Start::Done(LoadOutcome::Skipped);
                }
                (state.current_page + 1, false)
            }
        };

        if !initial {
            let now = Instant::now();
            let cached = state
                .cache
                .as_ref()
                .and_then(|cache| cache.lookup(page, self.inner.config.cache_ttl, now))
                .map(<[ImageItem]>::to_vec);

            if let Some(items) = cached {
                debug!(page, count = items.len(), "Serving feed page from cache");
                state.replace_items(items);
                state.current_page = state.current_page.max(page);
                return Start::Done(LoadOutcome::Cached { page });
            }
        }

        state.abort_in_flight();
        state.generation += 1;
        let generation = state.generation;

        if initial {
            state.loading = true;
        } else {
            state.loading_more = true;
        }

        debug!(page, initial, generation, "Requesting feed page");
        let client = Arc::clone(&self.inner.client);
        let config = self.inner.config.clone();
        let handle = tokio::spawn(async move { fetch_with_timeout(client, page, &config).await });
        state.in_flight = Some(handle.abort_handle());

        Start::Spawned {
            page,
            initial,
            generation,
            handle,
        }
    }

    fn finish(
        &self,
        page: u32,
        initial: bool,
        generation: u64,
        result: Result<FeedPage>,
    ) -> LoadOutcome {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        if state.generation != generation {
            debug!(page, generation, current = state.generation, "Discarding superseded feed result");
            return LoadOutcome::Cancelled;
        }

        state.in_flight = None;
        state.loading = false;
        state.loading_more = false;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) if e.is_cancelled() => return LoadOutcome::Cancelled,
            Err(e) => {
                warn!(page, error = %e, "Failed to load feed page");
                state.last_error = Some(e.to_string());
                return LoadOutcome::Failed;
            }
        };

        let FeedPage {
            items, received, ..
        } = fetched;
        let now = Instant::now();

        let added = if initial {
            state.replace_items(items);
            let snapshot = state.items.clone();
            state.cache = Some(FeedCache::new(snapshot, page, now));
            state.items.len()
        } else {
            let added = state.append_unique(items);
            let merged = state.items.clone();
            match state.cache.as_mut() {
                Some(cache) => cache.extend(merged, page, now),
                None => state.cache = Some(FeedCache::new(merged, page, now)),
            }
            added
        };

        state.has_more = received == self.inner.config.page_size;
        state.current_page = page;
        state.last_error = None;

        debug!(
            page,
            added,
            total = state.items.len(),
            has_more = state.has_more,
            "Applied feed page"
        );
        LoadOutcome::Fetched { page, added }
    }
}

async fn fetch_with_timeout<C: FeedClient>(
    client: Arc<C>,
    page: u32,
    config: &FeedConfig,
) -> Result<FeedPage> {
    match tokio::time::timeout(config.request_timeout, client.fetch_page(page)).await {
        Ok(result) => result,
        Err(_) => Err(GalleryError::Timeout(config.request_timeout)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefetchMessage {
    More,
    Cancel,
}

/// Sender side of the prefetch worker. Requests never block the caller.
///
/// Cancelling aborts the in-flight page right away rather than waiting for the
/// worker, which may itself be parked on that page.
#[derive(Clone)]
pub struct PrefetchHandle {
    tx: flume::Sender<PrefetchMessage>,
    cancel: Arc<dyn Fn() + Send + Sync>,
}

impl MoreItems for PrefetchHandle {
    fn request_more(&self) {
        if self.tx.send(PrefetchMessage::More).is_err() {
            warn!("Prefetch worker is gone, dropping request");
        }
    }

    fn cancel_pending(&self) {
        (self.cancel)();
        // Drops any request still queued behind the aborted one.
        if self.tx.send(PrefetchMessage::Cancel).is_err() {
            warn!("Prefetch worker is gone, dropping cancel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// In-memory feed with a call counter and an optional gate on one page.
    struct ScriptedClient {
        pages: HashMap<u32, Vec<ImageItem>>,
        calls: AtomicUsize,
        gate: Option<(u32, Arc<Notify>)>,
        failing: Mutex<HashSet<u32>>,
    }

    impl ScriptedClient {
        fn with_page_sizes(sizes: &[usize]) -> Self {
            let mut pages = HashMap::new();
            let mut next = 0;
            for (i, size) in sizes.iter().enumerate() {
                let items = (next..next + size)
                    .map(|n| ImageItem::new(format!("img_{n:04}.png"), format!("http://h/{n}.png")))
                    .collect();
                next += size;
                pages.insert(i as u32 + 1, items);
            }
            Self {
                pages,
                calls: AtomicUsize::new(0),
                gate: None,
                failing: Mutex::new(HashSet::new()),
            }
        }

        fn gated(mut self, page: u32, notify: Arc<Notify>) -> Self {
            self.gate = Some((page, notify));
            self
        }

        fn fail_page(&self, page: u32) {
            self.failing.lock().insert(page);
        }

        fn heal_page(&self, page: u32) {
            self.failing.lock().remove(&page);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FeedClient for ScriptedClient {
        async fn fetch_page(&self, page: u32) -> Result<FeedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((gated, notify)) = &self.gate {
                if *gated == page {
                    notify.notified().await;
                }
            }
            if self.failing.lock().contains(&page) {
                return Err(GalleryError::Status(500));
            }
            let items = self.pages.get(&page).cloned().unwrap_or_default();
            Ok(FeedPage {
                page,
                received: items.len(),
                items,
            })
        }
    }

    fn controller(client: ScriptedClient) -> FeedController<ScriptedClient> {
        FeedController::new(client, FeedConfig::default())
    }

    fn names(controller: &FeedController<ScriptedClient>) -> Vec<String> {
        controller.with_items(|items| items.iter().map(|i| i.name.clone()).collect())
    }

    async fn wait_for_calls(controller: &FeedController<ScriptedClient>, calls: usize) {
        while controller.client().calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let controller = controller(ScriptedClient::with_page_sizes(&[50, 50, 10]));

        assert_eq!(
            controller.load_initial().await,
            LoadOutcome::Fetched { page: 1, added: 50 }
        );
        assert_eq!(
            controller.load_more().await,
            LoadOutcome::Fetched { page: 2, added: 50 }
        );
        assert_eq!(
            controller.load_more().await,
            LoadOutcome::Fetched { page: 3, added: 10 }
        );

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 110);
        assert!(!snapshot.has_more);
        assert!(!snapshot.loading);
        assert!(!snapshot.loading_more);

        assert_eq!(controller.load_more().await, LoadOutcome::Skipped);
        assert_eq!(controller.len(), 110);
        assert_eq!(controller.client().calls(), 3);
    }

    #[tokio::test]
    async fn test_no_duplicate_names_in_session() {
        let mut client = ScriptedClient::with_page_sizes(&[50, 50]);
        // Page 2 repeats the last five names of page 1.
        let overlap: Vec<ImageItem> = client.pages[&1][45..].to_vec();
        client.pages.get_mut(&2).unwrap()[..5].clone_from_slice(&overlap);
        let controller = controller(client);

        controller.refresh().await;
        assert_eq!(
            controller.load_more().await,
            LoadOutcome::Fetched { page: 2, added: 45 }
        );

        let names = names(&controller);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names.len(), 95);
        // The page was full, so more may follow.
        assert!(controller.has_more());
    }

    #[tokio::test]
    async fn test_cached_page_skips_network() {
        let controller = controller(ScriptedClient::with_page_sizes(&[50, 50, 50]));
        controller.load_initial().await;
        controller.load_more().await;
        assert_eq!(controller.client().calls(), 2);

        assert_eq!(
            controller.load_page(2, false).await,
            LoadOutcome::Cached { page: 2 }
        );
        assert_eq!(controller.client().calls(), 2);
        assert_eq!(controller.len(), 100);
        assert!(!controller.snapshot().loading_more);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let config = FeedConfig::default().with_cache_ttl(Duration::ZERO);
        let controller =
            FeedController::new(ScriptedClient::with_page_sizes(&[50, 50]), config);
        controller.load_initial().await;
        controller.load_more().await;

        assert_eq!(
            controller.load_page(2, false).await,
            LoadOutcome::Fetched { page: 2, added: 0 }
        );
        assert_eq!(controller.client().calls(), 3);
        assert_eq!(controller.len(), 100);
    }

    #[tokio::test]
    async fn test_superseded_request_does_not_touch_state() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::with_page_sizes(&[50, 50]).gated(2, Arc::clone(&gate));
        let controller = controller(client);
        controller.load_initial().await;

        let background = controller.clone();
        let pending = tokio::spawn(async move { background.load_more().await });
        wait_for_calls(&controller, 2).await;
        assert!(controller.snapshot().loading_more);

        assert_eq!(
            controller.refresh().await,
            LoadOutcome::Fetched { page: 1, added: 50 }
        );
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), LoadOutcome::Cancelled);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 50);
        assert_eq!(snapshot.current_page, 1);
        assert!(!snapshot.loading_more);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_cancel_clears_flags() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::with_page_sizes(&[50, 50]).gated(2, Arc::clone(&gate));
        let controller = controller(client);
        controller.load_initial().await;

        let background = controller.clone();
        let pending = tokio::spawn(async move { background.load_more().await });
        wait_for_calls(&controller, 2).await;

        controller.cancel();
        assert_eq!(pending.await.unwrap(), LoadOutcome::Cancelled);
        assert!(!controller.snapshot().loading_more);
        assert_eq!(controller.len(), 50);
    }

    #[tokio::test]
    async fn test_failure_keeps_items_and_allows_retry() {
        let client = ScriptedClient::with_page_sizes(&[50, 50]);
        client.fail_page(2);
        let controller = controller(client);
        controller.load_initial().await;

        assert_eq!(controller.load_more().await, LoadOutcome::Failed);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 50);
        assert!(!snapshot.loading_more);
        assert!(snapshot.has_more);
        assert_eq!(snapshot.current_page, 1);
        assert!(snapshot.last_error.is_some());

        controller.client().heal_page(2);
        assert_eq!(
            controller.load_more().await,
            LoadOutcome::Fetched { page: 2, added: 50 }
        );
        assert!(controller.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::with_page_sizes(&[50, 50]).gated(2, gate);
        let config = FeedConfig::default().with_request_timeout(Duration::from_millis(20));
        let controller = FeedController::new(client, config);
        controller.load_initial().await;

        assert_eq!(controller.load_more().await, LoadOutcome::Failed);
        assert!(!controller.snapshot().loading_more);
        assert_eq!(controller.len(), 50);
    }

    #[tokio::test]
    async fn test_check_connection_online_loads_first_page() {
        let controller = controller(ScriptedClient::with_page_sizes(&[50]));
        assert_eq!(controller.server_status(), ServerStatus::Checking);

        assert_eq!(controller.check_connection().await, ServerStatus::Online);
        assert_eq!(controller.len(), 50);
        // Probe plus the initial load.
        assert_eq!(controller.client().calls(), 2);
        assert!(!controller.snapshot().loading);
    }

    #[tokio::test]
    async fn test_check_connection_offline_and_retry() {
        let client = ScriptedClient::with_page_sizes(&[20]);
        client.fail_page(1);
        let controller = controller(client);

        assert_eq!(controller.check_connection().await, ServerStatus::Offline);
        assert!(!controller.snapshot().loading);
        assert!(controller.is_empty());

        controller.client().heal_page(1);
        assert_eq!(controller.check_connection().await, ServerStatus::Online);
        assert_eq!(controller.len(), 20);
        assert!(!controller.has_more());
    }

    #[tokio::test]
    async fn test_refresh_resets_paging() {
        let controller = controller(ScriptedClient::with_page_sizes(&[50, 10]));
        controller.load_initial().await;
        controller.load_more().await;
        assert!(!controller.has_more());

        controller.refresh().await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 50);
        assert_eq!(snapshot.current_page, 1);
        assert!(snapshot.has_more);

        // The old snapshot is gone, so page 2 is fetched again.
        assert_eq!(
            controller.load_more().await,
            LoadOutcome::Fetched { page: 2, added: 10 }
        );
        assert_eq!(controller.client().calls(), 4);
    }

    #[tokio::test]
    async fn test_prefetcher_loads_next_page() {
        let controller = controller(ScriptedClient::with_page_sizes(&[50, 50, 5]));
        controller.load_initial().await;

        let prefetch = controller.spawn_prefetcher();
        prefetch.request_more();
        prefetch.request_more();

        let deadline = Instant::now() + Duration::from_secs(5);
        while controller.len() < 100 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(controller.len(), 100);
    }

    #[tokio::test]
    async fn test_prefetch_cancel_aborts_page_in_flight() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::with_page_sizes(&[50, 50]).gated(2, Arc::clone(&gate));
        let controller = controller(client);
        controller.load_initial().await;

        let prefetch = controller.spawn_prefetcher();
        prefetch.request_more();
        wait_for_calls(&controller, 2).await;
        assert!(controller.snapshot().loading_more);

        prefetch.cancel_pending();
        assert!(!controller.snapshot().loading_more);

        // Releasing the page afterwards must not apply it.
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 50);
        assert_eq!(snapshot.current_page, 1);
        assert!(!snapshot.loading_more);
        assert_eq!(controller.client().calls(), 2);
    }
}
