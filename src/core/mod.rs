pub mod catalog;
pub mod engine;
pub mod index;
pub mod pipeline;
pub mod runner;
pub mod selection;
pub mod selector;
pub mod session;

pub use crate::domain::model::{ConversionReport, RawRecord, Role};
pub use crate::domain::ports::{ConfigProvider, GeodesyProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
