//! Background sampling/adaptation loop.
//!
//! Two cadences on one thread: a sample every `sampling_interval_ms`, an
//! adaptation tick every `adaptation_interval_ms`. Between deadlines the
//! thread parks; `stop()` sets the cancel flag and unparks it.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::controller::{Shared, TickOutcome};

/// Name given to the worker thread.
pub const THREAD_NAME: &str = "morpheus-adapt";

pub(crate) fn spawn(shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || run(&shared))
}

/// Advances `deadline` by `period`, skipping missed periods.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next <= now { now + period } else { next }
}

fn run(shared: &Shared) {
    let runtime = &shared.config().runtime;
    let sampling = Duration::from_millis(runtime.sampling_interval_ms);
    let adaptation = Duration::from_millis(runtime.adaptation_interval_ms);

    let start = Instant::now();
    let mut next_sample = start;
    let mut next_adapt = start + adaptation;
    let mut read_failing = false;

    while !shared.is_cancelled() {
        let now = Instant::now();

        if now >= next_sample {
            match shared.sample_once() {
                Ok(_) => read_failing = false,
                Err(err) if !read_failing => {
                    tracing::warn!(%err, "counter read failed");
                    read_failing = true;
                }
                Err(_) => {}
            }
            next_sample = next_deadline(next_sample, sampling, now);
        }

        if shared.is_cancelled() {
            break;
        }

        if now >= next_adapt {
            if let TickOutcome::Switched { from, to } = shared.adapt_once(true) {
                tracing::trace!(%from, %to, "tick switched strategy");
            }
            next_adapt = next_deadline(next_adapt, adaptation, now);
        }

        let wake = next_sample.min(next_adapt);
        let now = Instant::now();
        if wake > now {
            thread::park_timeout(wake - now);
        }
    }
}
