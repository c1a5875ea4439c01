//! SeaORM repository implementations
//!
//! Each repository owns the persistence logic for one aggregate. Every
//! mutating method executes its invariant checks and writes inside a single
//! transaction; the unique indexes from the migrations catch whatever a
//! concurrent writer slips past the in-transaction checks, and such
//! constraint errors are translated back into the structured taxonomy.

pub mod pipeline;
pub mod stage;
pub mod status_catalog;
pub mod sub_stage;

pub use pipeline::PipelineSeaOrmRepository;
pub use stage::StageSeaOrmRepository;
pub use status_catalog::StatusCatalogSeaOrmRepository;
pub use sub_stage::SubStageSeaOrmRepository;
