pub use super::pipelines::Entity as Pipelines;
pub use super::stages::Entity as Stages;
pub use super::status_catalog::Entity as StatusCatalog;
pub use super::sub_stages::Entity as SubStages;
