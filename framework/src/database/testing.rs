//! Shared fixtures for data-layer tests

use crate::database::base::Base;
use crate::database::engine::Engine;

pub(crate) mod note {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "notes")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub(crate) mod tag {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub label: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// In-memory SQLite engine with a single pooled connection
pub(crate) async fn memory_engine() -> Engine {
    Engine::connect_url_with("sqlite::memory:", false, Some(1))
        .await
        .expect("in-memory engine")
}

/// Memory engine with the `notes` table created
pub(crate) async fn setup_notes() -> Engine {
    let engine = memory_engine().await;
    let mut base = Base::new();
    base.register::<note::Entity>();
    base.create_all(&engine).await.expect("create notes table");
    engine
}
