// Worker constants (no magic values inline)
use std::time::Duration;

/// Sleep duration when no jobs are available
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(500);

/// Sleep duration after worker error before retry
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Retention window for finalized job results (2 hours)
pub const DEFAULT_RESULT_RETENTION_MS: i64 = 2 * 60 * 60 * 1000;

/// Soft cap: cooperative cancellation is requested at this point (2 hours)
pub const DEFAULT_SOFT_TIME_LIMIT: Duration = Duration::from_secs(2 * 60 * 60);

/// Hard cap: the job is forcibly terminated at this point (2 hours)
///
/// Matches the soft cap by default, which makes the cooperative phase a
/// no-op unless a deployment configures a shorter soft limit.
pub const DEFAULT_HARD_TIME_LIMIT: Duration = Duration::from_secs(2 * 60 * 60);

/// Default recovery window for orphaned jobs (5 minutes)
pub const DEFAULT_RECOVERY_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Default interval between sync fan-out triggers (minutes)
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u64 = 60;
