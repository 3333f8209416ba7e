use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use floatdeck_gateway::{Gateway, GatewayError};
use floatdeck_schema::{
    FetchResultSet, FilterState, FloatSummary, ProfilePoint, TimeSeriesPoint,
};

use crate::resolver;

/// Page size for the map marker fetch.
pub const FLOAT_MAP_LIMIT: u32 = 100;
/// Page size for the authoritative float catalog fetch.
pub const CATALOG_LIMIT: u32 = 500;
/// Rows shown by the lightweight summary view over the catalog.
pub const SUMMARY_ROWS: usize = 20;

type Slot<T> = Arc<RwLock<FetchResultSet<T>>>;

/// Fans out the four filter-driven fetches. Each fetch is independent:
/// concurrent, unordered, own loading flag; one failing never cancels
/// the others. Completions are fenced by a generation counter so a
/// superseded refresh can never overwrite newer state.
pub struct FetchOrchestrator {
    gateway: Arc<dyn Gateway>,
    generation: Arc<AtomicU64>,
    time_series: Slot<TimeSeriesPoint>,
    float_map: Slot<FloatSummary>,
    profile: Slot<ProfilePoint>,
    catalog: Slot<FloatSummary>,
    profile_candidates: Arc<Vec<String>>,
    profile_cycle: u32,
}

/// Join handle over one refresh cycle's four tasks. Dropping it detaches
/// the tasks; they still complete and settle their slots.
pub struct RefreshHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshHandle {
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

impl FetchOrchestrator {
    pub fn new(gateway: Arc<dyn Gateway>, profile_candidates: Vec<String>, profile_cycle: u32) -> Self {
        Self {
            gateway,
            generation: Arc::new(AtomicU64::new(0)),
            time_series: Arc::new(RwLock::new(FetchResultSet::default())),
            float_map: Arc::new(RwLock::new(FetchResultSet::default())),
            profile: Arc::new(RwLock::new(FetchResultSet::default())),
            catalog: Arc::new(RwLock::new(FetchResultSet::default())),
            profile_candidates: Arc::new(profile_candidates),
            profile_cycle,
        }
    }

    /// Dispatch all four fetches for the given filter snapshot.
    pub async fn refresh(&self, filters: &FilterState) -> RefreshHandle {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, variable = %filters.variable, "refresh dispatched");

        self.time_series.write().await.loading = true;
        self.float_map.write().await.loading = true;
        self.profile.write().await.loading = true;
        self.catalog.write().await.loading = true;

        let mut tasks = Vec::with_capacity(4);

        {
            let gateway = self.gateway.clone();
            let slot = self.time_series.clone();
            let counter = self.generation.clone();
            let variable = filters.variable;
            let start = filters.start_date;
            let end = filters.end_date;
            tasks.push(tokio::spawn(async move {
                let result = gateway.daily_avg(variable, start, end).await;
                settle(&slot, &counter, generation, result, "daily-avg").await;
            }));
        }

        {
            let gateway = self.gateway.clone();
            let slot = self.float_map.clone();
            let counter = self.generation.clone();
            tasks.push(tokio::spawn(async move {
                let result = gateway.floats(FLOAT_MAP_LIMIT).await;
                settle(&slot, &counter, generation, result, "float-map").await;
            }));
        }

        {
            let gateway = self.gateway.clone();
            let slot = self.profile.clone();
            let counter = self.generation.clone();
            let candidates = self.profile_candidates.clone();
            let cycle = self.profile_cycle;
            tasks.push(tokio::spawn(async move {
                // The resolver swallows per-candidate failures itself;
                // exhaustion is an empty set, not an error.
                let found = resolver::find_profile(gateway.as_ref(), &candidates, cycle).await;
                settle(&slot, &counter, generation, Ok(found), "profile").await;
            }));
        }

        {
            let gateway = self.gateway.clone();
            let slot = self.catalog.clone();
            let counter = self.generation.clone();
            tasks.push(tokio::spawn(async move {
                let result = gateway.floats(CATALOG_LIMIT).await;
                settle(&slot, &counter, generation, result, "catalog").await;
            }));
        }

        RefreshHandle { tasks }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn time_series(&self) -> FetchResultSet<TimeSeriesPoint> {
        self.time_series.read().await.clone()
    }

    pub async fn float_map(&self) -> FetchResultSet<FloatSummary> {
        self.float_map.read().await.clone()
    }

    pub async fn profile(&self) -> FetchResultSet<ProfilePoint> {
        self.profile.read().await.clone()
    }

    pub async fn catalog(&self) -> FetchResultSet<FloatSummary> {
        self.catalog.read().await.clone()
    }

    /// The summary view shares the catalog fetch, truncated for display.
    /// The stored catalog itself is never cut.
    pub async fn summary(&self) -> Vec<FloatSummary> {
        self.catalog
            .read()
            .await
            .data
            .iter()
            .take(SUMMARY_ROWS)
            .cloned()
            .collect()
    }
}

/// Apply a fetch completion to its slot, or discard it whole if the
/// refresh that dispatched it has been superseded.
async fn settle<T>(
    slot: &Slot<T>,
    counter: &AtomicU64,
    generation: u64,
    result: Result<Vec<T>, GatewayError>,
    what: &str,
) {
    let mut slot = slot.write().await;
    if counter.load(Ordering::SeqCst) != generation {
        debug!(what, generation, "discarding stale fetch completion");
        return;
    }
    match result {
        Ok(data) => {
            slot.data = data;
            slot.last_error = None;
        }
        Err(err) => {
            warn!(what, %err, "fetch failed, clearing result set");
            slot.data = Vec::new();
            slot.last_error = Some(err.to_string());
        }
    }
    slot.loading = false;
}
