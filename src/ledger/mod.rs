//! Shared deductible, out-of-pocket-maximum and combined-limit accounting

mod quota;
mod pool;

pub use quota::{CombinedLimitStatus, PoolStatus, QuotaLedger};
pub use pool::{CombinedLimitPool, PoolKey, PoolKind, PoolScope, QuotaPool};
