//! Declarative base
//!
//! The registry data-model entities attach to. Entities are ordinary SeaORM
//! entities; attaching them lets the data layer create or drop their tables
//! without a migration step.
//!
//! # Example
//!
//! ```rust,ignore
//! // models/todos.rs
//! datalayer::declare_model!(Entity);
//!
//! // bootstrap
//! let base = Base::discover();
//! base.create_all(&engine).await?;
//! ```

use sea_orm::sea_query::{Alias, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, EntityTrait, Schema};

use crate::database::engine::Engine;
use crate::error::FrameworkError;

/// One attached entity
///
/// Built with [`ModelRegistration::of`]; usually submitted through
/// [`declare_model!`](crate::declare_model).
#[derive(Clone, Copy)]
pub struct ModelRegistration {
    table_name: fn() -> String,
    create_table: fn(&Schema) -> TableCreateStatement,
}

impl ModelRegistration {
    pub const fn of<E: EntityTrait + Default>() -> Self {
        Self {
            table_name: table_name_of::<E>,
            create_table: create_table_of::<E>,
        }
    }

    pub fn table_name(&self) -> String {
        (self.table_name)()
    }
}

impl std::fmt::Debug for ModelRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelRegistration")
            .field(&self.table_name())
            .finish()
    }
}

fn table_name_of<E: EntityTrait + Default>() -> String {
    E::default().table_name().to_string()
}

fn create_table_of<E: EntityTrait + Default>(schema: &Schema) -> TableCreateStatement {
    schema.create_table_from_entity(E::default())
}

inventory::collect!(ModelRegistration);

/// Attach an entity to every [`Base::discover`]ed base
///
/// ```rust,ignore
/// datalayer::declare_model!(todos::Entity);
/// ```
#[macro_export]
macro_rules! declare_model {
    ($entity:ty) => {
        $crate::inventory::submit! {
            $crate::database::base::ModelRegistration::of::<$entity>()
        }
    };
}

/// Registry of entities, in registration order
#[derive(Debug, Clone, Default)]
pub struct Base {
    models: Vec<ModelRegistration>,
}

impl Base {
    /// An empty base
    pub fn new() -> Self {
        Self::default()
    }

    /// A base holding every entity submitted with `declare_model!`
    pub fn discover() -> Self {
        let mut base = Self::new();
        for registration in inventory::iter::<ModelRegistration> {
            base.attach(*registration);
        }
        base
    }

    /// Attach an entity; attaching the same table twice is a no-op
    pub fn register<E: EntityTrait + Default>(&mut self) -> &mut Self {
        self.attach(ModelRegistration::of::<E>());
        self
    }

    fn attach(&mut self, registration: ModelRegistration) {
        let name = registration.table_name();
        if self.contains(&name) {
            tracing::debug!(table = %name, "model already attached");
            return;
        }
        self.models.push(registration);
    }

    /// Table names, in registration order
    pub fn tables(&self) -> Vec<String> {
        self.models.iter().map(ModelRegistration::table_name).collect()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.models.iter().any(|m| m.table_name() == table)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Create every attached table that does not exist yet
    pub async fn create_all(&self, engine: &Engine) -> Result<(), FrameworkError> {
        let backend = engine.backend();
        let schema = Schema::new(backend);

        for model in &self.models {
            let mut stmt = (model.create_table)(&schema);
            stmt.if_not_exists();
            engine.execute(backend.build(&stmt)).await?;
            tracing::info!(table = %model.table_name(), "table ready");
        }
        Ok(())
    }

    /// Drop every attached table, newest registration first
    pub async fn drop_all(&self, engine: &Engine) -> Result<(), FrameworkError> {
        let backend = engine.backend();

        for model in self.models.iter().rev() {
            let name = model.table_name();
            let stmt = Table::drop()
                .table(Alias::new(name.as_str()))
                .if_exists()
                .to_owned();
            engine.execute(backend.build(&stmt)).await?;
            tracing::info!(table = %name, "table dropped");
        }
        Ok(())
    }
}
