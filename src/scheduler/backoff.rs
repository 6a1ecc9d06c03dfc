use std::time::Duration;

use rand::Rng;

/// Upper bound on any retry delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Delay before retry attempt `retries` (0-indexed).
pub fn backoff(retries: u32) -> Duration {
    backoff_with(retries, &mut rand::thread_rng())
}

/// `2^(retries+2)` seconds plus up to 50% jitter, capped at one day.
pub fn backoff_with<R: Rng + ?Sized>(retries: u32, rng: &mut R) -> Duration {
    let Some(base) = 2u64.checked_pow(retries.saturating_add(2)) else {
        return MAX_BACKOFF;
    };

    let half = base / 2;
    let jitter = if half >= 1 { rng.gen_range(0..half) } else { 0 };

    Duration::from_secs(base.saturating_add(jitter)).min(MAX_BACKOFF)
}
