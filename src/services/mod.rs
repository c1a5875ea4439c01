//! Business-logic services over the repositories
//!
//! The services are the inbound surface of the engine: the (excluded)
//! presentation layer resolves a pipeline, stage, or sub-stage and calls
//! exactly one operation here per request. They add orchestration and
//! operational logging; the invariants themselves are enforced inside the
//! repositories' transactions.

pub mod catalog;
pub mod pipeline_query;
pub mod stage_manager;
pub mod sub_stage_manager;

pub use catalog::CatalogService;
pub use pipeline_query::PipelineQueryService;
pub use stage_manager::StageManagerService;
pub use sub_stage_manager::SubStageManagerService;
