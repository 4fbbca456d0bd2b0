//! Sessions and the session factory
//!
//! A [`Session`] is one unit of work: it owns at most one transaction and
//! ends with `commit`, `rollback` or drop (which rolls back). Sessions are
//! independent of each other and must not be shared between tasks; the API
//! takes `&mut self`/`self` so the compiler enforces that.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

use crate::database::engine::Engine;
use crate::error::FrameworkError;

/// Settings applied to every session a factory produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSettings {
    expire_on_commit: bool,
}

impl SessionSettings {
    /// Whether loaded objects are invalidated and reloaded after commit
    ///
    /// Always `false`: models returned by a session are plain owned values
    /// and stay usable after the transaction commits.
    pub fn expire_on_commit(&self) -> bool {
        self.expire_on_commit
    }
}

/// Produces sessions bound to one engine
///
/// Cheap to clone. Creating a session does no I/O.
///
/// # Example
///
/// ```rust,ignore
/// let sessions = SessionFactory::new(engine);
///
/// let mut session = sessions.session();
/// let todo = new_todo.insert(session.connection().await?).await?;
/// session.commit().await?;
///
/// // Still usable, nothing is reloaded
/// println!("{}", todo.title);
/// ```
#[derive(Debug, Clone)]
pub struct SessionFactory {
    engine: Engine,
    settings: SessionSettings,
}

/// Boxed future returned by [`SessionFactory::scope`] closures
pub type ScopeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FrameworkError>> + Send + 'a>>;

impl SessionFactory {
    /// Bind a factory to an engine
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            settings: SessionSettings::default(),
        }
    }

    /// Settings shared by all sessions from this factory
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The engine sessions are bound to
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Open a new session
    pub fn session(&self) -> Session {
        Session {
            engine: self.engine.clone(),
            settings: self.settings,
            tx: None,
        }
    }

    /// Run `f` inside a fresh session
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. The
    /// error from `f` is returned even if the rollback fails too.
    ///
    /// ```rust,ignore
    /// let todo = sessions
    ///     .scope(|s| Box::pin(async move {
    ///         Ok(new_todo.insert(s.connection().await?).await?)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn scope<F, T>(&self, f: F) -> Result<T, FrameworkError>
    where
        F: for<'a> FnOnce(&'a mut Session) -> ScopeFuture<'a, T>,
    {
        let mut session = self.session();
        match f(&mut session).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = session.rollback().await {
                    tracing::warn!(error = %rollback, "session rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// A unit-of-work scope
///
/// The transaction starts on the first call to [`Session::connection`].
/// Pass the returned transaction to SeaORM queries.
pub struct Session {
    engine: Engine,
    settings: SessionSettings,
    tx: Option<DatabaseTransaction>,
}

impl Session {
    /// The session's transaction, begun on first use
    ///
    /// Connection failures (unreachable host, bad credentials) surface here.
    pub async fn connection(&mut self) -> Result<&DatabaseTransaction, FrameworkError> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                tracing::debug!("session begin");
                self.engine.begin().await?
            }
        };
        Ok(&*self.tx.insert(tx))
    }

    /// Open a savepoint inside the session's transaction
    ///
    /// The nested transaction commits into the session, not to the database.
    pub async fn begin_nested(&mut self) -> Result<DatabaseTransaction, FrameworkError> {
        Ok(self.connection().await?.begin().await?)
    }

    /// Whether a transaction has been started
    pub fn is_active(&self) -> bool {
        self.tx.is_some()
    }

    /// Settings inherited from the factory
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Commit the transaction, if one was started
    pub async fn commit(mut self) -> Result<(), FrameworkError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            tracing::debug!("session commit");
        }
        Ok(())
    }

    /// Roll back the transaction, if one was started
    pub async fn rollback(mut self) -> Result<(), FrameworkError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            tracing::debug!("session rollback");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.is_active())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{memory_engine, note, setup_notes};
    use pretty_assertions::assert_eq;
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

    async fn note_count(engine: &Engine) -> u64 {
        note::Entity::find().count(engine.connection()).await.unwrap()
    }

    #[tokio::test]
    async fn test_factory_does_not_expire_on_commit() {
        let sessions = SessionFactory::new(memory_engine().await);
        assert!(!sessions.settings().expire_on_commit());
        assert!(!sessions.session().settings().expire_on_commit());
    }

    #[tokio::test]
    async fn test_session_is_lazy() {
        let sessions = SessionFactory::new(memory_engine().await);
        let session = sessions.session();
        assert!(!session.is_active());
        // Committing an unused session is a no-op
        session.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_model_usable_after_commit() {
        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let mut session = sessions.session();
        let inserted = note::ActiveModel {
            title: Set("write tests".to_string()),
            ..Default::default()
        }
        .insert(session.connection().await.unwrap())
        .await
        .unwrap();
        assert!(session.is_active());
        session.commit().await.unwrap();

        assert_eq!(inserted.title, "write tests");
        let stored = note::Entity::find_by_id(inserted.id)
            .one(engine.connection())
            .await
            .unwrap();
        assert_eq!(stored, Some(inserted));
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_changes() {
        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let mut session = sessions.session();
        note::ActiveModel {
            title: Set("discarded".to_string()),
            ..Default::default()
        }
        .insert(session.connection().await.unwrap())
        .await
        .unwrap();
        session.rollback().await.unwrap();
        assert_eq!(note_count(&engine).await, 0);

        {
            let mut dropped = sessions.session();
            note::ActiveModel {
                title: Set("dropped".to_string()),
                ..Default::default()
            }
            .insert(dropped.connection().await.unwrap())
            .await
            .unwrap();
        }
        assert_eq!(note_count(&engine).await, 0);
    }

    #[tokio::test]
    async fn test_nested_rollback_keeps_outer_work() {
        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let mut session = sessions.session();
        note::ActiveModel {
            title: Set("outer".to_string()),
            ..Default::default()
        }
        .insert(session.connection().await.unwrap())
        .await
        .unwrap();

        let nested = session.begin_nested().await.unwrap();
        note::ActiveModel {
            title: Set("inner".to_string()),
            ..Default::default()
        }
        .insert(&nested)
        .await
        .unwrap();
        nested.rollback().await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(note_count(&engine).await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let mut first = sessions.session();
        note::ActiveModel {
            title: Set("first".to_string()),
            ..Default::default()
        }
        .insert(first.connection().await.unwrap())
        .await
        .unwrap();
        first.commit().await.unwrap();

        let mut second = sessions.session();
        note::ActiveModel {
            title: Set("second".to_string()),
            ..Default::default()
        }
        .insert(second.connection().await.unwrap())
        .await
        .unwrap();
        second.rollback().await.unwrap();

        let titles: Vec<String> = note::Entity::find()
            .all(engine.connection())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_scope_commits_on_ok_and_rolls_back_on_err() {
        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let kept = sessions
            .scope(|s| {
                Box::pin(async move {
                    let model = note::ActiveModel {
                        title: Set("kept".to_string()),
                        ..Default::default()
                    }
                    .insert(s.connection().await?)
                    .await?;
                    Ok(model)
                })
            })
            .await
            .unwrap();
        assert_eq!(kept.title, "kept");

        let failed: Result<(), FrameworkError> = sessions
            .scope(|s| {
                Box::pin(async move {
                    note::ActiveModel {
                        title: Set("lost".to_string()),
                        ..Default::default()
                    }
                    .insert(s.connection().await?)
                    .await?;
                    Err(FrameworkError::internal("abort"))
                })
            })
            .await;
        assert!(failed.is_err());
        assert_eq!(note_count(&engine).await, 1);
    }

    #[tokio::test]
    async fn test_scope_keeps_original_error_when_rollback_fails() {
        use sea_orm::ConnectionTrait;

        let engine = setup_notes().await;
        let sessions = SessionFactory::new(engine.clone());

        let result: Result<(), FrameworkError> = sessions
            .scope(|s| {
                Box::pin(async move {
                    // End the transaction behind the session's back
                    s.connection().await?.execute_unprepared("ROLLBACK").await?;
                    Err(FrameworkError::internal("abort"))
                })
            })
            .await;

        match result {
            Err(FrameworkError::Internal { message }) => assert_eq!(message, "abort"),
            other => panic!("expected the closure's error, got {:?}", other),
        }
    }
}
