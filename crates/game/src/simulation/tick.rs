use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

pub struct FixedTimestep {
    tick_rate: u32,
    dt: Duration,
    accumulator: Duration,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: Duration::from_secs(1) / tick_rate,
            accumulator: Duration::ZERO,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> Duration {
        self.dt
    }

    /// Long stalls are clamped so the loop never tries to catch up on more
    /// than a quarter second at once.
    pub fn accumulate(&mut self, delta: Duration) {
        self.accumulator += delta.min(MAX_FRAME_DELTA);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self) -> Duration {
        self.dt.saturating_sub(self.accumulator)
    }
}

/// Fixed-cadence driver. The tick callback always runs to completion; the
/// stop flag is only read between ticks.
pub struct GameLoop {
    timestep: FixedTimestep,
    running: Arc<AtomicBool>,
    ticks: u64,
}

impl GameLoop {
    pub fn new(tick_rate: u32, running: Arc<AtomicBool>) -> Self {
        Self {
            timestep: FixedTimestep::new(tick_rate),
            running,
            ticks: 0,
        }
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Runs every tick that `delta` makes due. Returns how many ran.
    pub fn update<F>(&mut self, delta: Duration, tick_fn: &mut F) -> u32
    where
        F: FnMut(u64),
    {
        self.timestep.accumulate(delta);

        let mut ticks_run = 0;
        while self.is_running() && self.timestep.consume_tick() {
            tick_fn(self.ticks);
            self.ticks += 1;
            ticks_run += 1;
        }

        ticks_run
    }

    /// Blocks the calling thread until the stop flag is cleared.
    pub fn run<F>(&mut self, mut tick_fn: F)
    where
        F: FnMut(u64),
    {
        log::info!(
            "Game loop started at {} ticks/s",
            self.timestep.tick_rate()
        );

        let mut last = Instant::now();
        while self.is_running() {
            let now = Instant::now();
            self.update(now - last, &mut tick_fn);
            last = now;

            thread::sleep(self.timestep.remaining());
        }

        log::info!("Game loop stopped after {} ticks", self.ticks);
    }
}
