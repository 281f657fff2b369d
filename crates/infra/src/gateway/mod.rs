//! Persistence gateway boundary.
//!
//! One generic interface (`Gateway<E>`) for create/read/update/delete/list of
//! an entity type, with explicit transactions supplied by the caller.

/// Implements `TransactionSource` for a gateway by delegating to its `db` field.
macro_rules! delegate_transactions {
    ($gateway:ty, $tx:ty $(, $generic:ident)?) => {
        #[async_trait::async_trait]
        impl$(<$generic: Send + 'static>)? $crate::gateway::TransactionSource for $gateway {
            type Tx = $tx;

            async fn begin(
                &self,
                mode: $crate::gateway::TxMode,
            ) -> $crate::gateway::StoreResult<$tx> {
                self.db.begin(mode).await
            }

            async fn commit(&self, tx: $tx) -> $crate::gateway::StoreResult<()> {
                self.db.commit(tx).await
            }

            async fn rollback(&self, tx: $tx) -> $crate::gateway::StoreResult<()> {
                self.db.rollback(tx).await
            }
        }
    };
}

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{MemoryDatabase, MemoryDrawingGateway, MemoryShapeGateway, MemoryTx};
pub use postgres::{PgDatabase, PgDrawingGateway, PgShapeGateway, PgTx};
pub use r#trait::{Gateway, StoreError, StoreResult, TransactionSource, TxMode};
