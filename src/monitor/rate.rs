use std::collections::HashMap;
use std::time::Instant;

/// One reading of a cumulative counter, stamped with a monotonic clock.
///
/// Wall-clock time is deliberately absent: NTP jumps must never corrupt
/// a rate computation.
#[derive(Clone, Copy, Debug)]
pub struct CounterSample {
    pub value: u64,
    pub taken_at: Instant,
}

impl CounterSample {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            taken_at: Instant::now(),
        }
    }

    pub fn at(value: u64, taken_at: Instant) -> Self {
        Self { value, taken_at }
    }
}

/// The cumulative counters the sampler tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterId {
    DiskRead,
    DiskWrite,
    NetSent,
    NetRecv,
}

#[derive(Clone, Copy, Debug)]
struct Tracked {
    last_sample: CounterSample,
    last_rate: f64,
}

/// Converts consecutive readings of cumulative counters into rates in
/// counter-units per second.
///
/// Rules, in order:
/// - first observation of a counter id reports 0.0;
/// - non-positive elapsed time (duplicate or out-of-order tick) repeats the
///   previously reported rate, never divides;
/// - a decreased value (counter reset or wrap) clamps the delta to zero
///   instead of going negative;
/// - the new sample always replaces the stored one, whichever branch ran.
#[derive(Debug, Default)]
pub struct RateTracker {
    counters: HashMap<CounterId, Tracked>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, id: CounterId, sample: CounterSample) -> f64 {
        let Some(tracked) = self.counters.get_mut(&id) else {
            self.counters.insert(
                id,
                Tracked {
                    last_sample: sample,
                    last_rate: 0.0,
                },
            );
            return 0.0;
        };

        // duration_since saturates to zero for out-of-order instants.
        let elapsed = sample
            .taken_at
            .duration_since(tracked.last_sample.taken_at)
            .as_secs_f64();

        if elapsed <= 0.0 {
            tracked.last_sample = sample;
            return tracked.last_rate;
        }

        let delta = sample.value.saturating_sub(tracked.last_sample.value);
        let rate = delta as f64 / elapsed;
        tracked.last_sample = sample;
        tracked.last_rate = rate;
        rate
    }
}
