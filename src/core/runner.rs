use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct ConversionRunner<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ConversionRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting conversion");

        tracing::info!("📥 Reading input table...");
        let rows = self.pipeline.extract().await?;

        tracing::info!("🔧 Converting {} rows...", rows.len());
        let report = self.pipeline.transform(rows).await?;
        if report.failed() > 0 {
            tracing::warn!(
                "⚠️ {} of {} rows could not be converted",
                report.failed(),
                report.len()
            );
        }

        tracing::info!("💾 Writing results...");
        let output_path = self.pipeline.load(report).await?;

        tracing::info!(
            "📁 Output saved to: {} ({:.2?})",
            output_path,
            started.elapsed()
        );
        Ok(output_path)
    }
}
