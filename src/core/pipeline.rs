use crate::core::engine::{CancellationHandle, TransformationEngine};
use crate::core::selection::SelectionSnapshot;
use crate::core::session::ConverterSession;
use crate::core::{ConfigProvider, ConversionReport, Pipeline, RawRecord, Storage};
use crate::domain::model::CoordinateFrame;
use crate::utils::error::{ConvertError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

/// Written next to the converted table.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub source: CoordinateFrame,
    pub target: CoordinateFrame,
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
}

/// Reads a CSV of coordinate triples, converts it and writes the results.
pub struct ConversionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    snapshot: SelectionSnapshot,
    engine: TransformationEngine,
    cancel: CancellationHandle,
}

impl<S: Storage, C: ConfigProvider> ConversionPipeline<S, C> {
    /// Freezes the session's current selections; fails if a role is unset.
    pub fn new(
        storage: S,
        config: C,
        session: &ConverterSession,
        engine: TransformationEngine,
    ) -> Result<Self> {
        Ok(Self {
            storage,
            config,
            snapshot: session.snapshot()?,
            engine,
            cancel: CancellationHandle::new(),
        })
    }

    pub fn cancel_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn render_csv(report: &ConversionReport) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["x", "y", "z", "status", "error"])?;
        for row in &report.rows {
            match row {
                Ok(record) => writer.write_record([
                    record.x.to_string(),
                    record.y.to_string(),
                    record.z.to_string(),
                    "ok".to_string(),
                    String::new(),
                ])?,
                Err(e) => {
                    let reason = e.to_string();
                    writer.write_record(["", "", "", "error", reason.as_str()])?
                }
            }
        }
        writer
            .into_inner()
            .map_err(|e| ConvertError::IoError(e.into_error()))
    }

    fn summary(&self, report: &ConversionReport) -> ConversionSummary {
        ConversionSummary {
            generated_at: Utc::now(),
            input: self.config.input_path().to_string(),
            source: self.snapshot.input_frame(),
            target: self.snapshot.output_frame(),
            total: report.len(),
            converted: report.succeeded(),
            failed: report.failed(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ConversionPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        let input = self.config.input_path();
        tracing::debug!("Reading coordinates from: {}", input);
        let data = self.storage.read_file(input).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.config.has_header())
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());

        let mut records = Vec::new();
        // Bytes, not strings: a row that is not UTF-8 must fail on its own.
        for row in reader.byte_records() {
            let row = row?;
            let cell = |i: usize| {
                row.get(i)
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default()
            };
            records.push(RawRecord {
                x: cell(0),
                y: cell(1),
                z: cell(2),
            });
        }

        tracing::info!("📊 Extracted {} rows from {}", records.len(), input);
        Ok(records)
    }

    async fn transform(&self, data: Vec<RawRecord>) -> Result<ConversionReport> {
        self.engine.convert(data, &self.snapshot, &self.cancel).await
    }

    async fn load(&self, report: ConversionReport) -> Result<String> {
        let stem = self.config.output_stem();
        let csv_name = format!("{}.csv", stem);
        let summary_name = format!("{}_summary.json", stem);

        let csv_data = Self::render_csv(&report)?;
        let summary_data = serde_json::to_vec_pretty(&self.summary(&report))?;

        if self.config.archive() {
            let zip_name = format!("{}.zip", stem);
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file::<_, ()>(csv_name.as_str(), FileOptions::default())?;
                zip.write_all(&csv_data)?;

                zip.start_file::<_, ()>(summary_name.as_str(), FileOptions::default())?;
                zip.write_all(&summary_data)?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            let path = self.output_file(&zip_name);
            tracing::debug!("Writing archive ({} bytes) to {}", zip_data.len(), path);
            self.storage.write_file(&path, &zip_data).await?;
            return Ok(path);
        }

        let path = self.output_file(&csv_name);
        self.storage.write_file(&path, &csv_data).await?;
        self.storage
            .write_file(&self.output_file(&summary_name), &summary_data)
            .await?;
        tracing::debug!("Results written to {}", path);
        Ok(path)
    }
}
