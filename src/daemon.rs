//! Daemon runtime with statum state machine for the dispatch loop
//!
//! Feeds decoded button edges into the [`Mapper`] and wakes up whenever the
//! scheduler has a callback due. Everything runs on one task: actions are not
//! `Send`, so the loop must be driven from a current-thread runtime.
//!
//! # State Machine
//!
//! ```text
//! Configured ──► Running ──► Stopped
//!   (profile)     (loop)      (flushed)
//! ```
//!
//! # Loop
//!
//! ```text
//!  input lines ──┐
//!  deadline ─────┼──► select! ──► Mapper::handle_event / run_due ──► OutputEvent log
//!  shutdown ─────┘
//! ```

use crate::config::{ConfigError, Profile, Settings};
use crate::controller::InputCommand;
use crate::mapper::{Mapper, OutputEvent};
use statum::{machine, state};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound of callbacks run while flushing on shutdown
const FLUSH_LIMIT: usize = 10_000;

/// Number of most recent output edges kept for inspection
pub const RECENT_OUTPUT: usize = 256;

/// Daemon errors
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

/// States for the daemon lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum DaemonState {
    Configured, // Bindings parsed, mapper ready
    Running,    // Dispatch loop active
    Stopped,    // Input closed, in-flight runs flushed
}

/// Dispatch daemon with compile-time state safety via statum
#[machine]
pub struct Daemon<S: DaemonState> {
    name: String,
    settings: Settings,
    mapper: Mapper,
    handled_events: usize,
    emitted_edges: usize,
    haptic_events: usize,
    recent: VecDeque<OutputEvent>,
}

impl<S: DaemonState> Daemon<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handled_events(&self) -> usize {
        self.handled_events
    }

    /// Total number of edges emitted on the virtual device
    pub fn emitted_edges(&self) -> usize {
        self.emitted_edges
    }

    pub fn haptic_events(&self) -> usize {
        self.haptic_events
    }

    /// The last [`RECENT_OUTPUT`] edges, oldest first
    pub fn recent_output(&self) -> &VecDeque<OutputEvent> {
        &self.recent
    }
}

impl Daemon<Configured> {
    /// Builds the mapper from a profile; any invalid binding rejects the profile
    pub fn configure(profile: &Profile) -> Result<Self, DaemonError> {
        info!("Configuring daemon for profile: {}", profile.name);
        let bindings = match profile.build_bindings() {
            Ok(bindings) => bindings,
            Err(e) => {
                error!("Failed to build bindings: {}", e);
                return Err(e.into());
            }
        };
        let mapper = Mapper::new(bindings);

        Ok(Self::new(
            profile.name.clone(),
            profile.settings.clone(),
            mapper,
            0,                                      // handled_events
            0,                                      // emitted_edges
            0,                                      // haptic_events
            VecDeque::with_capacity(RECENT_OUTPUT), // recent
        ))
    }

    pub fn start(self) -> Daemon<Running> {
        info!("Starting daemon: {}", self.name);
        self.transition()
    }
}

impl Daemon<Running> {
    /// Main dispatch loop
    ///
    /// Runs until the input closes, a `quit` line arrives or `shutdown` is cancelled.
    /// Malformed input lines are logged and skipped.
    pub async fn run_until_shutdown<R>(
        mut self,
        input: R,
        shutdown: CancellationToken,
    ) -> Result<Daemon<Stopped>, DaemonError>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("Starting dispatch loop for: {}", self.name);
        let started = Instant::now();
        let idle = Duration::from_millis(self.settings.idle_wakeup_ms.max(1));
        let mut lines = input.lines();

        loop {
            // Deadlines beyond what Instant can hold are treated like an idle wakeup
            let wake_at = self
                .mapper
                .next_deadline()
                .and_then(|deadline| started.checked_add(deadline))
                .unwrap_or_else(|| Instant::now() + idle);

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received for: {}", self.name);
                    break;
                }

                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            info!("Input closed for: {}", self.name);
                            break;
                        }
                        Err(e) => {
                            error!("Failed to read input: {}", e);
                            return Err(e.into());
                        }
                    };
                    self.mapper.run_due(started.elapsed());
                    match InputCommand::parse_line(&line) {
                        Ok(Some(InputCommand::Button(event))) => {
                            self.handled_events += 1;
                            self.mapper.handle_event(&event);
                        }
                        Ok(Some(InputCommand::Quit)) => {
                            info!("Quit requested");
                            break;
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Skipping input line '{}': {}", line, e),
                    }
                }

                _ = tokio::time::sleep_until(wake_at) => {
                    self.mapper.run_due(started.elapsed());
                }
            }

            self.collect_output();
        }

        info!("Transitioning to Stopped state: {}", self.name);
        let flushed = self.mapper.flush(FLUSH_LIMIT);
        debug!("Flushed {} callbacks", flushed);
        self.collect_output();
        Ok(self.transition())
    }

    fn collect_output(&mut self) {
        for haptic in self.mapper.drain_feedback() {
            debug!("Haptic feedback: {:?}", haptic);
            self.haptic_events += 1;
        }

        for event in self.mapper.drain_output() {
            if self.settings.log_output {
                info!(
                    "{:?} {} at {}",
                    event.state,
                    event.key,
                    event.timestamp.format("%H:%M:%S.%3f")
                );
            }
            self.emitted_edges += 1;
            if self.recent.len() == RECENT_OUTPUT {
                self.recent.pop_front();
            }
            self.recent.push_back(event);
        }
    }
}
