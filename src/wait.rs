//! Bounded readiness polling.
//!
//! [`wait_until_ready`] repeatedly reads the status word through a caller
//! supplied closure and classifies it until the printer either resolves
//! (ready or faulted) or the wall-clock budget runs out. Transient channel
//! failures are absorbed with a doubling, capped backoff; the time they
//! consume still counts against the same budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::Error;
use crate::status::{classify, describe, Classified, UnknownPolicy};

/// Cooperative cancellation flag, checked at every sleep.
///
/// Clones share the same flag, so one can be handed to another thread
/// while a job is running.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Parameters for a readiness wait.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Total wall-clock budget.
    pub timeout: Duration,
    /// Sleep between status polls.
    pub interval: Duration,
    /// Upper bound for the backoff applied after transient channel
    /// failures.
    pub max_backoff: Duration,
    /// How unrecognized status codes are treated.
    pub unknown_policy: UnknownPolicy,
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            timeout: Duration::from_secs(60),
            interval: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            unknown_policy: UnknownPolicy::default(),
        }
    }
}

impl WaitConfig {
    /// Same settings with a different budget.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        WaitConfig {
            timeout,
            ..self.clone()
        }
    }
}

/// How a readiness wait resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The printer resolved to a non-fault state.
    Ready,
    /// The printer reported a fault; waiting longer will not help.
    Fault { raw: u32, text: &'static str },
    /// The budget elapsed while the printer was still blocking.
    TimedOut,
}

/// Poll the status word until the printer resolves or the budget runs out.
///
/// The first classification happens before any sleep, so an idle printer
/// costs a single poll. A fault classification returns immediately.
/// Transient poll failures are retried with doubled, capped sleeps; if the
/// budget runs out while the channel is still failing, the last failure is
/// escalated to [`Error::Connection`].
pub fn wait_until_ready<F>(
    mut poll: F,
    config: &WaitConfig,
    cancel: Option<&CancelToken>,
) -> Result<WaitOutcome, Error>
where
    F: FnMut() -> Result<u32, Error>,
{
    let start = Instant::now();
    let mut sleep_for = config.interval;
    let mut channel_down: Option<Error> = None;

    loop {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        match poll() {
            Ok(raw) => {
                channel_down = None;
                sleep_for = config.interval;

                let classified = classify(raw);
                if !classified.blocks(config.unknown_policy) {
                    return Ok(match classified {
                        Classified::Fault { raw, text } => WaitOutcome::Fault { raw, text },
                        Classified::Unknown { raw } => {
                            // Surfaced distinctly so operators can audit how
                            // often "unknown but assumed ready" occurs.
                            warn!("treating unknown status 0x{:08X} as ready", raw);
                            WaitOutcome::Ready
                        }
                        _ => WaitOutcome::Ready,
                    });
                }
                debug!("printer not ready: {} (0x{:08X})", describe(raw), raw);
            }
            Err(err) if err.is_transient() => {
                warn!("status poll failed, retrying: {}", err);
                sleep_for = (sleep_for * 2).min(config.max_backoff);
                channel_down = Some(err);
            }
            Err(err) => return Err(err),
        }

        if start.elapsed() >= config.timeout {
            return match channel_down {
                Some(err) => Err(Error::Connection(err.to_string())),
                None => Ok(WaitOutcome::TimedOut),
            };
        }
        std::thread::sleep(sleep_for);
    }
}
