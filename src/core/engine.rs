use crate::core::selection::{ResolvedSelection, SelectionSnapshot};
use crate::domain::model::{
    Axis, Column, ConversionReport, CoordinateFrame, CoordinateRecord, RawRecord, RowResult,
};
use crate::domain::ports::GeodesyProvider;
use crate::utils::error::{ConvertError, Result, RowError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Cancels an in-flight batch as a whole. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives as long as `self`, so this only returns once set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Everything one row needs, shared read-only by every worker.
struct RowPlan {
    provider: Arc<dyn GeodesyProvider>,
    input_horizontal: ResolvedSelection,
    input_vertical: ResolvedSelection,
    output_horizontal: ResolvedSelection,
    output_vertical: ResolvedSelection,
    source: Arc<CoordinateFrame>,
    frame: Arc<CoordinateFrame>,
}

impl RowPlan {
    fn new(snapshot: &SelectionSnapshot, provider: Arc<dyn GeodesyProvider>) -> Self {
        Self {
            provider,
            input_horizontal: snapshot.input_horizontal.clone(),
            input_vertical: snapshot.input_vertical.clone(),
            output_horizontal: snapshot.output_horizontal.clone(),
            output_vertical: snapshot.output_vertical.clone(),
            source: Arc::new(snapshot.input_frame()),
            frame: Arc::new(snapshot.output_frame()),
        }
    }

    fn convert_row(&self, raw: &RawRecord) -> RowResult {
        let x = parse_cell(Column::X, &raw.x)?;
        let y = parse_cell(Column::Y, &raw.y)?;
        let z = parse_cell(Column::Z, &raw.z)?;

        let h_in = self.input_horizontal.unit.to_meters;
        let h_out = self.output_horizontal.unit.to_meters;
        let (tx, ty) = self
            .provider
            .transform_horizontal(
                &self.input_horizontal.crs,
                &self.output_horizontal.crs,
                x * h_in,
                y * h_in,
            )
            .map_err(|source| RowError::Transform {
                axis: Axis::Horizontal,
                source,
            })?;

        let tz = self
            .provider
            .transform_vertical(
                &self.input_vertical.crs,
                &self.output_vertical.crs,
                z * self.input_vertical.unit.to_meters,
            )
            .map_err(|source| RowError::Transform {
                axis: Axis::Vertical,
                source,
            })?;

        Ok(CoordinateRecord {
            x: tx / h_out,
            y: ty / h_out,
            z: tz / self.output_vertical.unit.to_meters,
            source: Arc::clone(&self.source),
            frame: Arc::clone(&self.frame),
        })
    }
}

fn parse_cell(column: Column, cell: &str) -> std::result::Result<f64, RowError> {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RowError::Parse {
            column,
            value: cell.to_string(),
        }),
    }
}

/// Converts coordinate tables between the four selected (CRS, unit) pairs.
///
/// Rows are independent: a row that fails to parse or transform is
/// reported in its own slot and never stops the batch.
#[derive(Clone)]
pub struct TransformationEngine {
    provider: Arc<dyn GeodesyProvider>,
    concurrency: usize,
}

impl TransformationEngine {
    pub fn new(provider: Arc<dyn GeodesyProvider>, concurrency: usize) -> Self {
        Self {
            provider,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs the batch on the calling thread.
    pub fn convert_blocking(
        &self,
        table: &[RawRecord],
        snapshot: &SelectionSnapshot,
    ) -> ConversionReport {
        let plan = RowPlan::new(snapshot, Arc::clone(&self.provider));
        let rows = table.iter().map(|raw| plan.convert_row(raw)).collect();
        ConversionReport { rows }
    }

    /// Runs the batch across up to `concurrency` blocking workers.
    ///
    /// Results come back in input order. Cancelling `cancel` abandons the
    /// whole batch and returns [`ConvertError::Cancelled`].
    pub async fn convert(
        &self,
        table: Vec<RawRecord>,
        snapshot: &SelectionSnapshot,
        cancel: &CancellationHandle,
    ) -> Result<ConversionReport> {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        let total = table.len();
        if total == 0 {
            return Ok(ConversionReport::default());
        }

        let shards = self.concurrency.min(total);
        tracing::info!("🔧 Converting {} rows on {} workers", total, shards);

        let table = Arc::new(table);
        let plan = Arc::new(RowPlan::new(snapshot, Arc::clone(&self.provider)));
        let abandoned = Arc::new(AtomicBool::new(false));

        let mut workers = JoinSet::new();
        for shard in 0..shards {
            let table = Arc::clone(&table);
            let plan = Arc::clone(&plan);
            let cancel = cancel.clone();
            let abandoned = Arc::clone(&abandoned);
            workers.spawn_blocking(move || {
                let mut out = Vec::with_capacity(total / shards + 1);
                for index in (shard..table.len()).step_by(shards) {
                    if cancel.is_cancelled() || abandoned.load(Ordering::Relaxed) {
                        return None;
                    }
                    out.push((index, plan.convert_row(&table[index])));
                }
                Some(out)
            });
        }

        let mut indexed: Vec<(usize, RowResult)> = Vec::with_capacity(total);
        let outcome = loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    None => break Ok(()),
                    Some(Ok(Some(rows))) => indexed.extend(rows),
                    Some(Ok(None)) => break Err(ConvertError::Cancelled),
                    Some(Err(e)) => break Err(ConvertError::from(e)),
                },
                _ = cancel.cancelled() => break Err(ConvertError::Cancelled),
            }
        };

        if let Err(e) = outcome {
            abandoned.store(true, Ordering::Relaxed);
            workers.abort_all();
            tracing::warn!("⏹️ Conversion abandoned after {} of {} rows: {}", indexed.len(), total, e);
            return Err(e);
        }

        indexed.sort_unstable_by_key(|(index, _)| *index);
        let report = ConversionReport {
            rows: indexed.into_iter().map(|(_, row)| row).collect(),
        };
        for (index, row) in report.rows.iter().enumerate() {
            if let Err(e) = row {
                tracing::debug!("Row {} failed: {}", index + 1, e);
            }
        }
        tracing::info!(
            "✅ Conversion finished: {} converted, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }
}
