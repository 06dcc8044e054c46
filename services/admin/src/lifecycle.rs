//! Market suspend/resume control
//!
//! A market is either running or stopped. A scheduled suspension is not a
//! separate state: the market keeps running with a nonzero suspend epoch until
//! that epoch closes. This layer checks the precondition, forwards the
//! schedule to the engine and validates what comes back.
//!
//! There is no locking here. Two concurrent requests can both pass the
//! precondition; the engine decides how the second schedule update lands.

use crate::core::CoreEngine;
use crate::error::AdminError;
use crate::models::{ApiTime, ResumeResult, SuspendResult};
use anyhow::anyhow;
use tracing::info;
use types::market::Schedule;

/// Drives lifecycle transitions for one request.
pub struct LifecycleController<'a> {
    core: &'a dyn CoreEngine,
}

impl<'a> LifecycleController<'a> {
    pub fn new(core: &'a dyn CoreEngine) -> Self {
        Self { core }
    }

    /// Schedule a running market to stop at the epoch boundary at or after
    /// `when`. With `persist_book` unset the resting orders are purged.
    pub async fn suspend(
        &self,
        market: &str,
        when: Schedule,
        persist_book: bool,
    ) -> Result<SuspendResult, AdminError> {
        match self.core.market_running(market).await {
            None => return Err(AdminError::invalid(format!("unknown market {market:?}"))),
            Some(false) => return Err(AdminError::state(format!("market {market:?} not running"))),
            Some(true) => {}
        }

        let final_epoch = match self.core.suspend_market(market, when, persist_book).await {
            Ok(Some(epoch)) => epoch,
            Ok(None) => {
                return Err(AdminError::engine(
                    "failed to suspend market",
                    anyhow!("engine reported success without a final epoch for {market}"),
                ))
            }
            Err(err) => return Err(AdminError::engine("failed to suspend market", err)),
        };

        info!(
            market,
            final_epoch = final_epoch.idx,
            suspend_time = %final_epoch.end,
            persist_book,
            "market suspension scheduled"
        );
        Ok(SuspendResult {
            market: market.to_string(),
            finalepoch: final_epoch.idx,
            suspendtime: ApiTime(final_epoch.end),
        })
    }

    /// Schedule a stopped market to start at the first epoch after `when`.
    pub async fn resume(&self, market: &str, when: Schedule) -> Result<ResumeResult, AdminError> {
        match self.core.market_running(market).await {
            None => return Err(AdminError::invalid(format!("unknown market {market:?}"))),
            Some(true) => return Err(AdminError::state(format!("market {market:?} running"))),
            Some(false) => {}
        }

        let resumed = self
            .core
            .resume_market(market, when)
            .await
            .map_err(|err| AdminError::engine("failed to resume market", err))?;
        if resumed.epoch == 0 {
            return Err(AdminError::engine(
                "failed to resume market",
                anyhow!("engine reported success with start epoch 0 for {market}"),
            ));
        }

        info!(
            market,
            start_epoch = resumed.epoch,
            start_time = %resumed.start,
            "market resumption scheduled"
        );
        Ok(ResumeResult {
            market: market.to_string(),
            startepoch: resumed.epoch,
            starttime: ApiTime(resumed.start),
        })
    }
}
