use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Lower bound on externally observable verification latency (spec: "MUST
/// have lower bound >= 1 ms").
const FLOOR: Duration = Duration::from_millis(1);

/// Upper bound on the jitter term layered on top of the floor. A single
/// fixed delay is itself a distinguishing signal across a large sample
/// population; a bounded random jitter keeps valid and invalid outcomes
/// indistinguishable under realistic network jitter.
const JITTER_MAX_MICROS: u64 = 1500;

/// Pad the elapsed time since `start` up to `FLOOR + jitter`, using
/// cooperative suspension. Must be called on every verification path —
/// valid, invalid signature, and malformed alike — with the same floor and
/// jitter distribution, or the padding itself becomes a timing oracle.
pub async fn normalize(start: Instant) {
    let jitter_micros = rand::thread_rng().gen_range(0..=JITTER_MAX_MICROS);
    let target = FLOOR + Duration::from_micros(jitter_micros);
    let elapsed = start.elapsed();
    if elapsed < target {
        tokio::time::sleep(target - elapsed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pads_up_to_at_least_the_floor() {
        let start = Instant::now();
        normalize(start).await;
        assert!(start.elapsed() >= FLOOR);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_shrink_time_already_spent_above_the_ceiling() {
        let start = Instant::now();
        tokio::time::advance(Duration::from_millis(5)).await;
        let before = Instant::now();
        normalize(start).await;
        // No further sleep should have been scheduled: elapsed already
        // exceeds floor + max jitter.
        assert_eq!(Instant::now(), before);
    }
}
