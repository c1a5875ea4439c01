//! SeaORM entity models for the pipeline engine tables

pub mod pipelines;
pub mod prelude;
pub mod stages;
pub mod status_catalog;
pub mod sub_stages;
