//! Reconnect scheduler — retry state machine and fleet-dispersing backoff
//! (spec §4.2). Grounded on `zc-fleet-agent::heartbeat`'s ticking-loop shape,
//! generalized from a fixed-interval ticker into a retry-count-driven,
//! cancellable backoff.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A 24×4 table of primes in [67, 619], named in the spec's glossary as the
/// "prime-matrix time slot". Used only as an input to the slot-offset term
/// of the delay formula below; the exact sequence has no semantic meaning
/// beyond being device-stable and non-periodic (see DESIGN.md open question
/// 1 for why the full jitter layering was simplified around it).
#[rustfmt::skip]
const PRIME_MATRIX: [[u64; 4]; 24] = [
    [67, 71, 73, 79], [83, 89, 97, 101], [103, 107, 109, 113], [127, 131, 137, 139],
    [149, 151, 157, 163], [167, 173, 179, 181], [191, 193, 197, 199], [211, 223, 227, 229],
    [233, 239, 241, 251], [257, 263, 269, 271], [277, 281, 283, 293], [307, 311, 313, 317],
    [331, 337, 347, 349], [353, 359, 367, 373], [379, 383, 389, 397], [401, 409, 419, 421],
    [431, 433, 439, 443], [449, 457, 461, 463], [467, 479, 487, 491], [499, 503, 509, 521],
    [523, 541, 547, 557], [563, 569, 571, 577], [587, 593, 599, 601], [607, 613, 617, 619],
];

const MAC_SEED_MAX_OFFSET: u64 = 60;
const MAC_SEED_MULTIPLIER: u64 = 2;

/// MAC seed used when no real device MAC is available (tests, dev mode).
pub const SENTINEL_MAC_SEED: &str = "000000000000";

/// Deterministic FNV-1a hash, used to derive both the slot position and the
/// jitter term from the device's MAC seed. Not cryptographic; only needs to
/// disperse evenly across devices.
fn hash_seed(input: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in input.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// Compute the next reconnect delay (spec §4.2, normative algorithm,
/// simplified per DESIGN.md open-question decision 1):
///
/// 1. `base` — pure exponential backoff from `retry_count`.
/// 2. `mac_offset` — a per-device constant derived from hashing `mac_seed`.
/// 3. `slot_offset` — the device's position in the 24×4 prime-segment grid,
///    reduced modulo 300 so it stays on the same minutes-scale order the
///    spec describes rather than growing with the raw prime sum.
/// 4. `jitter` — one bounded random-looking term seeded from `mac_seed` and
///    `retry_count`, clamped to `min(120 + 20·retry_count, 300)`.
///
/// The sum is capped at `max_delay_seconds`. This satisfies the spec's only
/// binding property: for a fixed `retry_count`, the delay distribution
/// across a fleet of distinct MACs is approximately uniform over
/// `[base_delay, max_delay]`.
pub fn compute_delay(
    base_delay_seconds: u64,
    max_delay_seconds: u64,
    retry_count: u32,
    mac_seed: &str,
) -> u64 {
    let shift = retry_count.min(20);
    let base = base_delay_seconds.saturating_mul(1u64 << shift);

    let seed_hash = hash_seed(mac_seed);
    let mac_offset = (seed_hash % MAC_SEED_MAX_OFFSET) * MAC_SEED_MULTIPLIER;

    let primary = ((seed_hash >> 8) % 24) as usize;
    let sub = ((seed_hash >> 16) % 4) as usize;
    let mut raw_slot = 0u64;
    'outer: for (p, row) in PRIME_MATRIX.iter().enumerate() {
        for (s, width) in row.iter().enumerate() {
            if p == primary && s == sub {
                break 'outer;
            }
            raw_slot += width;
        }
    }
    let slot_offset = raw_slot % 300;

    let jitter_bound = (120 + 20 * retry_count as u64).min(300);
    let jitter_hash = hash_seed(&format!("{mac_seed}#{retry_count}"));
    let jitter = jitter_hash % (jitter_bound + 1);

    (base + mac_offset + slot_offset + jitter).min(max_delay_seconds)
}

#[derive(Debug, Error)]
pub enum ReconnectError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("retries exhausted after {0} attempts")]
    Exhausted(u32),
}

/// Injected capabilities the scheduler drives one attempt through. Kept as
/// a single trait (rather than three free functions) so a caller can share
/// mutable access to its transport handle across disconnect/connect/restart
/// without threading three separate `&mut` borrows.
#[async_trait]
pub trait ReconnectCapabilities: Send {
    async fn disconnect(&mut self);
    async fn connect(&mut self) -> Result<(), String>;
    /// Failure here is logged but does not fail the overall attempt — the
    /// session is up even if the shadow hasn't re-subscribed yet.
    async fn shadow_restart(&mut self) -> Result<(), String>;
}

/// Cooperative cancellation flag. Polled at every 1-second sleep tick so a
/// shutdown signal can interrupt a long backoff without delay.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Reconnecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
}

fn default_base_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    300
}

fn default_max_retry_attempts() -> u32 {
    10
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            base_delay_seconds: default_base_delay(),
            max_delay_seconds: default_max_delay(),
            max_retry_attempts: default_max_retry_attempts(),
        }
    }
}

/// Retry state machine: `Disconnected → Reconnecting → (Connected | Error)`.
/// Owns its own `retry_count`/`total_reconnects`/`next_delay_seconds`; no
/// other component mutates it.
pub struct ReconnectScheduler {
    config: ReconnectConfig,
    mac_seed: String,
    retry_count: u32,
    total_reconnects: u64,
    next_delay_seconds: u64,
    last_connect_time: Option<Instant>,
    state: ConnectionState,
}

impl ReconnectScheduler {
    pub fn new(config: ReconnectConfig, mac_seed: impl Into<String>) -> Self {
        let mac_seed = mac_seed.into();
        let next_delay_seconds = config.base_delay_seconds;
        ReconnectScheduler {
            config,
            mac_seed,
            retry_count: 0,
            total_reconnects: 0,
            next_delay_seconds,
            last_connect_time: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn total_reconnects(&self) -> u64 {
        self.total_reconnects
    }

    pub fn next_delay_seconds(&self) -> u64 {
        self.next_delay_seconds
    }

    /// `true` iff `retry_count < max_retry_attempts`.
    pub fn should_retry(&self) -> bool {
        self.retry_count < self.config.max_retry_attempts
    }

    /// Recompute `next_delay_seconds` for the current `retry_count`.
    pub fn next_delay(&self) -> Duration {
        Duration::from_secs(compute_delay(
            self.config.base_delay_seconds,
            self.config.max_delay_seconds,
            self.retry_count,
            &self.mac_seed,
        ))
    }

    fn reset_state(&mut self) {
        self.retry_count = 0;
        self.next_delay_seconds = self.config.base_delay_seconds;
        self.total_reconnects += 1;
        self.last_connect_time = Some(Instant::now());
        self.state = ConnectionState::Connected;
    }

    fn update_failure(&mut self) {
        self.retry_count += 1;
        self.next_delay_seconds = compute_delay(
            self.config.base_delay_seconds,
            self.config.max_delay_seconds,
            self.retry_count,
            &self.mac_seed,
        );
        if self.retry_count >= self.config.max_retry_attempts {
            self.state = ConnectionState::Error;
        }
    }

    /// Disconnect the existing session, sleep `next_delay` (if this isn't
    /// the first attempt), then call the injected `connect`. On success,
    /// call `shadow_restart` (logged, not fatal) and reset the state. On
    /// failure, record the failure and return an error.
    ///
    /// Sleeps decompose into 1-second ticks so `cancel` is observed
    /// promptly; a cancellation during the sleep returns `Exhausted`
    /// without attempting to connect.
    pub async fn attempt(
        &mut self,
        caps: &mut dyn ReconnectCapabilities,
        cancel: &CancelFlag,
    ) -> Result<(), ReconnectError> {
        self.state = ConnectionState::Reconnecting;
        caps.disconnect().await;

        if self.retry_count > 0 {
            let delay = self.next_delay();
            let mut remaining = delay;
            while remaining > Duration::ZERO {
                if cancel.is_cancelled() {
                    return Err(ReconnectError::Exhausted(self.retry_count));
                }
                let tick = remaining.min(Duration::from_secs(1));
                tokio::time::sleep(tick).await;
                remaining -= tick;
            }
        }

        match caps.connect().await {
            Ok(()) => {
                if let Err(e) = caps.shadow_restart().await {
                    tracing::warn!(error = %e, "shadow restart after reconnect failed, continuing");
                }
                self.reset_state();
                Ok(())
            }
            Err(e) => {
                self.update_failure();
                Err(ReconnectError::ConnectFailed(e))
            }
        }
    }
}
