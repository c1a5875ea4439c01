use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    /// `order` is a reserved word in most SQL dialects
    pub stage_order: i32,
    pub notes: Option<String>,
    pub completed_at: Option<ChronoDateTimeUtc>,
    pub is_current: bool,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pipelines::Entity",
        from = "Column::PipelineId",
        to = "super::pipelines::Column::Id"
    )]
    Pipelines,
    #[sea_orm(has_many = "super::sub_stages::Entity")]
    SubStages,
}

impl Related<super::pipelines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pipelines.def()
    }
}

impl Related<super::sub_stages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubStages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
