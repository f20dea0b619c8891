//! Fixed-interval tick source for autoplay.
//!
//! [`PlaybackClock`] holds a running [`IntervalTicker`] exactly while playback
//! is in the `Playing` mode. Releasing the ticker joins its thread and drains
//! the channel, so no tick produced before a pause can be observed after it.

use crate::cancellation::CancellationToken;
use crate::playback::PlaybackMode;
use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Bounds applied to any requested tick interval.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub struct IntervalTicker {
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn spawn(interval: Duration, generation: u64, sender: Sender<Tick>) -> Result<Self> {
        let interval = interval.clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name(format!("tourdeck-ticker-{generation}"))
            .spawn(move || {
                let mut next = Instant::now() + interval;
                loop {
                    let now = Instant::now();
                    if now < next {
                        thread::park_timeout(next - now);
                        if token.is_cancelled() {
                            break;
                        }
                        continue;
                    }
                    if token.is_cancelled() || sender.send(Tick { generation }).is_err() {
                        break;
                    }
                    next += interval;
                }
            })
            .context("failed to spawn ticker thread")?;
        Ok(Self {
            generation,
            interval,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                debug!(generation = self.generation, "Ticker thread panicked");
            }
        }
    }
}

pub struct PlaybackClock {
    interval: Duration,
    generation: u64,
    ticker: Option<IntervalTicker>,
    sender: Sender<Tick>,
    receiver: Receiver<Tick>,
}

impl PlaybackClock {
    pub fn new(interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            interval,
            generation: 0,
            ticker: None,
            sender,
            receiver,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Acquire a ticker when `mode` is `Playing`, release it otherwise.
    pub fn sync(&mut self, mode: PlaybackMode) -> Result<()> {
        let wants_ticks = mode == PlaybackMode::Playing;
        match (wants_ticks, self.ticker.is_some()) {
            (true, false) => self.acquire(),
            (false, true) => {
                self.release();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn acquire(&mut self) -> Result<()> {
        self.generation = self.generation.wrapping_add(1);
        let ticker = IntervalTicker::spawn(self.interval, self.generation, self.sender.clone())?;
        debug!(
            generation = self.generation,
            interval_ms = self.interval.as_millis() as u64,
            "Acquired playback ticker"
        );
        self.ticker = Some(ticker);
        Ok(())
    }

    pub fn release(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        let generation = ticker.generation();
        drop(ticker);
        let drained = self.receiver.try_iter().count();
        debug!(generation, drained, "Released playback ticker");
    }

    /// Block until the held ticker fires. Returns `false` on timeout or when
    /// no ticker is held.
    pub fn wait_tick(&self, timeout: Duration) -> bool {
        if self.ticker.is_none() {
            return false;
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(tick) if tick.generation == self.generation => return true,
                Ok(tick) => {
                    debug!(generation = tick.generation, "Discarding stale tick");
                }
                Err(_) => return false,
            }
        }
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.release();
    }
}
