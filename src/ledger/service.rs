// Async front for an async server layer

use crate::consensus::CancelToken;
use crate::ledger::{
    AmountResponse, ChainResponse, Ledger, LedgerError, MineOutcome, PoolResponse, Result,
    TransactionRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

/// Cloneable handle that runs ledger work off the async runtime threads.
///
/// Handlers receive this from the composition root instead of reaching for a
/// global ledger.
#[derive(Clone)]
pub struct LedgerService {
    ledger: Arc<Ledger>,
}

impl LedgerService {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Submit a transaction
    pub async fn submit(&self, request: TransactionRequest) -> Result<()> {
        let ledger = Arc::clone(&self.ledger);
        join(task::spawn_blocking(move || ledger.submit(&request)).await)
    }

    /// Run one mining round to completion
    pub async fn mine(&self) -> Result<MineOutcome> {
        let ledger = Arc::clone(&self.ledger);
        join(task::spawn_blocking(move || ledger.mine_with_cancel(&CancelToken::new())).await)
    }

    /// Run one mining round, cancelling the search once `limit` has passed.
    ///
    /// A block sealed right as the deadline hits is still reported as sealed.
    pub async fn mine_with_timeout(&self, limit: Duration) -> Result<MineOutcome> {
        let ledger = Arc::clone(&self.ledger);
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let mut handle = task::spawn_blocking(move || ledger.mine_with_cancel(&token));

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => join(joined),
            Err(_) => {
                log::warn!("Mining exceeded {:?}, cancelling", limit);
                cancel.cancel();
                join(handle.await)
            }
        }
    }

    pub async fn chain(&self) -> Result<ChainResponse> {
        let ledger = Arc::clone(&self.ledger);
        task::spawn_blocking(move || ChainResponse::from_ledger(&ledger))
            .await
            .map_err(worker_error)
    }

    pub async fn pool(&self) -> Result<PoolResponse> {
        let ledger = Arc::clone(&self.ledger);
        task::spawn_blocking(move || PoolResponse::from_ledger(&ledger))
            .await
            .map_err(worker_error)
    }

    pub async fn amount(&self, address: String) -> Result<AmountResponse> {
        let ledger = Arc::clone(&self.ledger);
        task::spawn_blocking(move || AmountResponse::from_ledger(&ledger, &address))
            .await
            .map_err(worker_error)
    }
}

fn join<T>(joined: std::result::Result<Result<T>, task::JoinError>) -> Result<T> {
    joined.map_err(worker_error)?
}

fn worker_error(err: task::JoinError) -> LedgerError {
    LedgerError::Worker(err.to_string())
}
