// Domain layer: core models and ports (interfaces) shared by the catalog, selection and engine code.

pub mod model;
pub mod ports;
