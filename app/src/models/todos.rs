//! Todos model

use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "todos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

datalayer::declare_model!(Entity);

impl ActiveModel {
    /// A new, not yet completed todo
    pub fn new_with_title(title: impl Into<String>) -> Self {
        Self {
            title: Set(title.into()),
            done: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
    }
}
