pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use adapters::geodesy::BuiltinGeodesy;
pub use core::{
    catalog::Catalog,
    engine::{CancellationHandle, TransformationEngine},
    pipeline::ConversionPipeline,
    runner::ConversionRunner,
    selection::{SelectionSnapshot, SelectionState},
    selector::IncrementalSelector,
    session::ConverterSession,
};
pub use domain::model::{Identifier, Role};
pub use utils::error::{ConvertError, Result};
