//! Per-sensor measurement retrieval.
//!
//! One inclusive range query is issued per distinct sensor id. Queries run on
//! the blocking pool with at most `min(sensors, max_concurrency)` in flight.
//! Each worker returns its own result; results are merged only after every
//! worker has finished.
//!
//! A failing sensor never aborts the others. Store errors, malformed items and
//! queries still running when the deadline elapses all end up as
//! [`SensorFailure`] entries next to whatever records were retrieved.

use super::validation::TimeWindow;
use crate::config::TimeSeriesKeys;
use crate::error::StoreError;
use crate::storage::{RawItem, TimeSeriesStore, sort_key_value};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use twinfed_types::entity::Sensor;
use twinfed_types::measurement::MeasurementRecord;
use twinfed_types::query::{FailureKind, SensorFailure};

/// Fetch parameters.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_concurrency: usize,
    pub deadline: Option<Instant>,
    pub keys: TimeSeriesKeys,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            deadline: None,
            keys: TimeSeriesKeys::default(),
        }
    }
}

/// Merged output of the fetch stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Records ordered by `(sensor_id, timestamp)`.
    pub records: Vec<MeasurementRecord>,
    /// Failures ordered by sensor id.
    pub failures: Vec<SensorFailure>,
}

/// What one worker produced for one sensor.
struct SensorData {
    records: Vec<MeasurementRecord>,
    malformed: Vec<String>,
}

type WorkerOutput = (String, Result<SensorData, SensorFailure>);

/// Bounded fan-out over a time-series store.
pub struct MeasurementFetcher {
    store: Arc<dyn TimeSeriesStore>,
    options: FetchOptions,
}

impl MeasurementFetcher {
    pub fn new(store: Arc<dyn TimeSeriesStore>, options: FetchOptions) -> Self {
        Self { store, options }
    }

    /// Retrieve every record of `sensors` within `window`.
    ///
    /// Completes when every per-sensor query has returned, failed or been cut
    /// off by the deadline.
    pub async fn fetch(&self, sensors: &[Sensor], window: TimeWindow) -> FetchOutcome {
        let mut ids = BTreeSet::new();
        for sensor in sensors {
            if sensor.id.trim().is_empty() {
                log::warn!("Sensor '{:?}' has no id; not fetched", sensor.name);
                continue;
            }
            ids.insert(sensor.id.clone());
        }

        if ids.is_empty() {
            return FetchOutcome::default();
        }

        let limit = self.options.max_concurrency.min(ids.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();
        let mut pending = HashMap::with_capacity(ids.len());

        log::debug!(
            "Fetching {} sensors over [{}, {}] with {} workers",
            ids.len(),
            window.start_millis,
            window.end_millis,
            limit
        );

        for sensor_id in ids {
            let store = Arc::clone(&self.store);
            let keys = self.options.keys.clone();
            let permits = Arc::clone(&semaphore);
            let deadline = self.options.deadline;
            let owner = sensor_id.clone();

            let handle = join_set.spawn(async move {
                let work = run_worker(store, keys, permits, sensor_id.clone(), window);
                let result = match deadline {
                    Some(deadline) => match tokio::time::timeout_at(deadline, work).await {
                        Ok(result) => result,
                        Err(_) => Err(SensorFailure {
                            sensor_id: sensor_id.clone(),
                            kind: FailureKind::Timeout,
                            message: "request deadline elapsed before the range query completed"
                                .to_string(),
                        }),
                    },
                    None => work.await,
                };
                (sensor_id, result)
            });
            pending.insert(handle.id(), owner);
        }

        collect(join_set, pending).await
    }
}

/// Waits for every worker and merges their outputs. `pending` maps task ids to
/// sensor ids so an aborted worker still yields a failure.
async fn collect(
    mut join_set: JoinSet<WorkerOutput>,
    mut pending: HashMap<task::Id, String>,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((task_id, (sensor_id, Ok(data)))) => {
                pending.remove(&task_id);
                if !data.malformed.is_empty() {
                    let failure = SensorFailure {
                        sensor_id: sensor_id.clone(),
                        kind: FailureKind::MalformedItem,
                        message: format!(
                            "{} item(s) skipped, first: {}",
                            data.malformed.len(),
                            data.malformed[0]
                        ),
                    };
                    log::warn!("Sensor {}: {}", sensor_id, failure.message);
                    outcome.failures.push(failure);
                }
                outcome.records.extend(data.records);
            }
            Ok((task_id, (sensor_id, Err(failure)))) => {
                pending.remove(&task_id);
                log::warn!(
                    "Range query for sensor {} failed ({}): {}",
                    sensor_id,
                    failure.kind,
                    failure.message
                );
                outcome.failures.push(failure);
            }
            Err(e) => match pending.remove(&e.id()) {
                Some(sensor_id) => {
                    log::warn!("Fetch worker for sensor {} aborted: {}", sensor_id, e);
                    outcome.failures.push(SensorFailure {
                        sensor_id,
                        kind: FailureKind::Internal,
                        message: format!("fetch worker aborted: {}", e),
                    });
                }
                None => log::warn!("Fetch worker aborted: {}", e),
            },
        }
    }

    outcome
        .records
        .sort_by(|a, b| (&a.sensor_id, a.timestamp).cmp(&(&b.sensor_id, b.timestamp)));
    outcome
        .failures
        .sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
    outcome
}

async fn run_worker(
    store: Arc<dyn TimeSeriesStore>,
    keys: TimeSeriesKeys,
    permits: Arc<Semaphore>,
    sensor_id: String,
    window: TimeWindow,
) -> Result<SensorData, SensorFailure> {
    let permit = permits.acquire_owned().await.map_err(|e| SensorFailure {
        sensor_id: sensor_id.clone(),
        kind: FailureKind::Internal,
        message: e.to_string(),
    })?;

    let id = sensor_id.clone();
    let joined = tokio::task::spawn_blocking(move || {
        // The permit is released when the store call returns, even if the
        // awaiting task was cut off by the deadline.
        let _permit = permit;
        query_sensor(store.as_ref(), &keys, &id, window)
    })
    .await;

    match joined {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(e)) => Err(SensorFailure {
            sensor_id,
            kind: failure_kind(&e),
            message: e.to_string(),
        }),
        Err(e) => Err(SensorFailure {
            sensor_id,
            kind: FailureKind::Internal,
            message: format!("range query task failed: {}", e),
        }),
    }
}

fn failure_kind(error: &StoreError) -> FailureKind {
    match error {
        StoreError::Unavailable(_) => FailureKind::Unavailable,
        StoreError::NotFound(_) => FailureKind::NotFound,
        StoreError::Timeout(_) => FailureKind::Timeout,
        StoreError::Malformed(_) => FailureKind::MalformedItem,
    }
}

/// Runs one range query and converts its items.
fn query_sensor(
    store: &dyn TimeSeriesStore,
    keys: &TimeSeriesKeys,
    sensor_id: &str,
    window: TimeWindow,
) -> Result<SensorData, StoreError> {
    let items = store.range_query(sensor_id, window.start_millis, window.end_millis)?;

    let mut data = SensorData {
        records: Vec::with_capacity(items.len()),
        malformed: Vec::new(),
    };
    for item in items {
        match record_from_item(&item, keys, sensor_id, window) {
            Ok(record) => data.records.push(record),
            Err(reason) => data.malformed.push(reason),
        }
    }

    Ok(data)
}

/// Converts a raw item, keeping every numeric non-key field.
///
/// Numeric strings count as numbers. Other values are not measurements and
/// are ignored.
pub(crate) fn record_from_item(
    item: &RawItem,
    keys: &TimeSeriesKeys,
    sensor_id: &str,
    window: TimeWindow,
) -> Result<MeasurementRecord, String> {
    match item.get(&keys.partition_key) {
        None => {}
        Some(Value::String(s)) if s == sensor_id => {}
        Some(other) => {
            return Err(format!(
                "'{}' is {} instead of \"{}\"",
                keys.partition_key, other, sensor_id
            ));
        }
    }

    let timestamp = item
        .get(&keys.sort_key)
        .and_then(sort_key_value)
        .ok_or_else(|| format!("missing or non-integer '{}'", keys.sort_key))?;

    if !window.contains(timestamp) {
        return Err(format!("timestamp {} outside the queried window", timestamp));
    }

    let mut record = MeasurementRecord::new(sensor_id, timestamp);
    for (name, value) in item {
        if keys.is_key(name) {
            continue;
        }
        let numeric = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        };
        if let Some(v) = numeric {
            record.fields.insert(name.clone(), v);
        }
    }

    Ok(record)
}
