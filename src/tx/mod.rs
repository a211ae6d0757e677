//! Transaction management.
//!
//! The inventory layer never opens transactions on its own: every repository
//! and model operation runs inside a transaction supplied by the caller.
//! [`finish`] gives the scoped commit-on-success / rollback-on-failure shape.

use serde::{Deserialize, Serialize};

use crate::storage::StorageBackend;
use crate::Result;

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Transaction trait that all backends must implement.
pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;
}

/// Commit `tx` if `outcome` is `Ok`, roll it back otherwise.
///
/// The original error wins over a rollback failure; the latter is logged.
pub async fn finish<B, T>(backend: &B, tx: B::Tx, outcome: Result<T>) -> Result<T>
where
    B: StorageBackend,
{
    match outcome {
        Ok(value) => {
            backend.commit_tx(tx).await?;
            Ok(value)
        }
        Err(err) => {
            let id = tx.id();
            if let Err(rollback_err) = backend.rollback_tx(tx).await {
                tracing::warn!(tx = id.0, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
