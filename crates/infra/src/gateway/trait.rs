use async_trait::async_trait;
use thiserror::Error;

use shapes_core::EntityId;

/// Access mode of a store transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TxMode {
    /// No writes; takes no write locks and may run alongside other readers.
    ReadOnly,
    ReadWrite,
}

/// Persistence operation error.
///
/// These are **infrastructure errors** (connectivity, constraints, missing
/// rows on update) as opposed to domain errors (validation, decoding).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    /// An update targeted an identifier that has no row.
    #[error("no {kind} with id {id} exists")]
    Missing { kind: &'static str, id: EntityId },

    #[error("write attempted in a read-only transaction")]
    ReadOnly,

    /// A stored row could not be turned back into an entity.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Source of explicit, scoped transactions.
///
/// A transaction is finished by handing it back to `commit` or `rollback`.
/// Dropping an unfinished transaction discards its writes.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    type Tx: Send;

    async fn begin(&self, mode: TxMode) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;
}

/// Durable storage for one entity type.
///
/// Every operation runs inside a transaction supplied by the caller, so a
/// sequence of calls (including cascades to owned entities) commits or
/// rolls back as one unit.
///
/// ## Save semantics
///
/// - `save` inserts and assigns a fresh identifier when the entity has none.
///   An entity that already carries an identifier is merged: the row is
///   overwritten when it exists, otherwise a fresh identifier is assigned.
/// - `persist_or_update` inserts an entity without identifier and overwrites
///   the row of an entity with one. An identifier with no row is
///   [`StoreError::Missing`] and nothing is written.
///
/// ## Lookups and deletes
///
/// `find_by_id` on an unknown identifier yields `None`, and `delete_by_id` on
/// one is a no-op. Callers decide whether that is a failure.
#[async_trait]
pub trait Gateway<E>: TransactionSource
where
    E: Send + 'static,
{
    async fn save(&self, tx: &mut Self::Tx, entity: E) -> StoreResult<E>;

    async fn persist_or_update(&self, tx: &mut Self::Tx, entity: E) -> StoreResult<E>;

    async fn find_by_id(&self, tx: &mut Self::Tx, id: EntityId) -> StoreResult<Option<E>>;

    /// All entities, ordered by identifier.
    async fn find_all(&self, tx: &mut Self::Tx) -> StoreResult<Vec<E>>;

    async fn delete_by_id(&self, tx: &mut Self::Tx, id: EntityId) -> StoreResult<()>;

    async fn delete_all(&self, tx: &mut Self::Tx) -> StoreResult<()>;

    async fn count(&self, tx: &mut Self::Tx) -> StoreResult<u64>;
}
