use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{catalog::CatalogSync, images::ImageLoader};

/// Tally of one completed sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Window positions considered.
    pub requested: usize,
    /// Positions already resident in memory.
    pub skipped_cached: usize,
    /// Positions fetched (or read from disk) and now in memory.
    pub loaded: usize,
    /// Positions whose load failed; logged, not retried.
    pub failed: usize,
}

/// Result of one [`Prefetcher::prefetch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// The sweep ran to the end.
    Completed(PrefetchReport),
    /// Another sweep was already running; this request did nothing.
    Skipped,
    /// No catalog could be obtained.
    NoCatalog,
}

/// Warms the images that follow a cursor position.
#[derive(Debug, Clone)]
pub struct Prefetcher {
    catalog: CatalogSync,
    loader: ImageLoader,
    image_size_suffix: Arc<str>,
    window: usize,
    running: Arc<AtomicBool>,
}

struct SweepGuard(Arc<AtomicBool>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Prefetcher {
    /// Warms `window` entries per sweep. A window of 0 disables prefetching.
    pub fn new(
        catalog: CatalogSync,
        loader: ImageLoader,
        image_size_suffix: impl Into<Arc<str>>,
        window: usize,
    ) -> Self {
        Self {
            catalog,
            loader,
            image_size_suffix: image_size_suffix.into(),
            window,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Entries considered per sweep.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Load the `window` entries after `from_index` that are not already in
    /// memory. Individual failures are logged and counted, never returned.
    pub async fn prefetch(&self, from_index: usize) -> PrefetchOutcome {
        if self.window == 0 {
            return PrefetchOutcome::Completed(PrefetchReport::default());
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("prefetch from {} skipped: sweep already running", from_index);
            return PrefetchOutcome::Skipped;
        }
        let _guard = SweepGuard(Arc::clone(&self.running));

        let catalog = match self.catalog.catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("prefetch from {} abandoned: {}", from_index, err);
                return PrefetchOutcome::NoCatalog;
            }
        };

        let indices = window_indices(from_index, self.window, catalog.len());
        let mut report = PrefetchReport {
            requested: indices.len(),
            ..PrefetchReport::default()
        };

        let targets: Vec<(usize, String)> = indices
            .into_iter()
            .filter_map(|index| {
                let url = catalog.get(index)?.image_url(&self.image_size_suffix);
                if self.loader.is_cached(&url) {
                    report.skipped_cached += 1;
                    None
                } else {
                    Some((index, url))
                }
            })
            .collect();

        let results = join_all(targets.iter().map(|(index, url)| async move {
            (*index, self.loader.load(url).await)
        }))
        .await;

        for (index, result) in results {
            match result {
                Ok(_) => report.loaded += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!("failed to prefetch image at index {}: {}", index, err);
                }
            }
        }

        info!(
            "prefetch from {} done: requested={}, cached={}, loaded={}, failed={}",
            from_index,
            report.requested,
            report.skipped_cached,
            report.loaded,
            report.failed
        );
        PrefetchOutcome::Completed(report)
    }

    /// Run [`Prefetcher::prefetch`] as a detached task.
    pub fn spawn(&self, from_index: usize) -> JoinHandle<PrefetchOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.prefetch(from_index).await })
    }
}

/// The `window` positions after `from`, wrapping over a ring of `len`.
/// `from` itself and repeats are never included.
pub fn window_indices(from: usize, window: usize, len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let from = from % len;
    (1..=window.min(len - 1))
        .map(|step| (from + step) % len)
        .collect()
}
