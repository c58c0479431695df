use crate::domain::model::{ConversionReport, CrsDefinition, RawRecord, Role};
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;

/// External geodesy engine. Coordinates cross this boundary in each CRS's
/// native linear unit (metres for projected and vertical CRS).
pub trait GeodesyProvider: Send + Sync {
    fn transform_horizontal(
        &self,
        src: &CrsDefinition,
        dst: &CrsDefinition,
        x: f64,
        y: f64,
    ) -> std::result::Result<(f64, f64), ProviderError>;

    fn transform_vertical(
        &self,
        src: &CrsDefinition,
        dst: &CrsDefinition,
        z: f64,
    ) -> std::result::Result<f64, ProviderError>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn crs_catalog_path(&self) -> &str;
    fn unit_catalog_path(&self) -> &str;
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_stem(&self) -> &str;
    fn archive(&self) -> bool;
    fn has_header(&self) -> bool;
    fn concurrency(&self) -> usize;
    /// Picker query text for a role, e.g. `"EPSG:4326"` or `"wgs 84"`.
    fn selection_query(&self, role: Role) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, data: Vec<RawRecord>) -> Result<ConversionReport>;
    async fn load(&self, report: ConversionReport) -> Result<String>;
}
