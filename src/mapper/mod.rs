//! Reference dispatcher that owns the scheduler, the pressed-key table and the bindings.
//!
//! The mapper is the only place that turns a logical button edge into a call on
//! an [`Action`]. Actions never see the mapper itself, only the
//! [`ExecutionContext`] implemented by its [`DispatchContext`].
//!
//! # Architecture
//!
//! ```text
//! InputEvent ──► Mapper::handle_event ──► bound Action
//!                      │                      │
//!                      │               DispatchContext
//!                      │               ├─ Scheduler  ◄── run_due / step
//!                      │               ├─ pressed-key table
//!                      ▼               └─ OutputEvent log
//!               unbound: ignored
//! ```

pub mod scheduler;

pub use scheduler::Scheduler;

use crate::actions::{Action, Callback, ExecutionContext, HapticData, Key};
use crate::controller::{ButtonState, ButtonType, InputEvent};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Key state on the virtual output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// One edge emitted on the virtual output device
#[derive(Debug, Clone)]
pub struct OutputEvent {
    pub key: Key,
    pub state: KeyState,
    /// Scheduler time of the edge
    pub offset: Duration,
    pub timestamp: DateTime<Local>,
}

/// Execution context handed to every action and scheduled callback.
///
/// A key counts as held while its press count is above zero. Only the 0 → 1 and
/// 1 → 0 transitions produce output edges.
#[derive(Debug, Default)]
pub struct DispatchContext {
    scheduler: Scheduler,
    pressed: HashMap<Key, u32>,
    output: Vec<OutputEvent>,
    feedback: Vec<HapticData>,
}

impl DispatchContext {
    fn emit(&mut self, key: Key, state: KeyState) {
        trace!("Output {:?} {:?}", key, state);
        self.output.push(OutputEvent {
            key,
            state,
            offset: self.scheduler.now(),
            timestamp: Local::now(),
        });
    }

    pub fn press_count(&self, key: Key) -> u32 {
        self.pressed.get(&key).copied().unwrap_or(0)
    }
}

impl ExecutionContext for DispatchContext {
    fn schedule(&mut self, delay: Duration, callback: Callback) {
        self.scheduler.schedule(delay, callback);
    }

    fn is_button_logically_held(&self, key: Key) -> bool {
        self.press_count(key) > 0
    }

    fn key_press(&mut self, key: Key) {
        let count = self.pressed.entry(key).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.emit(key, KeyState::Pressed);
        }
    }

    fn key_release(&mut self, key: Key) {
        match self.pressed.get_mut(&key) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.pressed.remove(&key);
                self.emit(key, KeyState::Released);
            }
            None => trace!("Release of {:?} ignored, key is not pressed", key),
        }
    }

    fn feedback(&mut self, haptic: HapticData) {
        debug!("Haptic feedback: {:?}", haptic);
        self.feedback.push(haptic);
    }
}

/// Owns bindings and dispatch state for one profile
#[derive(Debug, Default)]
pub struct Mapper {
    context: DispatchContext,
    bindings: HashMap<ButtonType, Box<dyn Action>>,
    /// Buttons currently held physically, used to release them on shutdown
    held_buttons: HashMap<ButtonType, DateTime<Local>>,
}

impl Mapper {
    pub fn new(bindings: HashMap<ButtonType, Box<dyn Action>>) -> Self {
        info!("Creating mapper with {} bindings", bindings.len());
        for (button, action) in &bindings {
            debug!("  {} => {}", button, action.describe());
        }
        Self {
            bindings,
            ..Default::default()
        }
    }

    /// Execution context for calling actions directly
    pub fn context(&mut self) -> &mut dyn ExecutionContext {
        &mut self.context
    }

    /// Current scheduler time
    pub fn now(&self) -> Duration {
        self.context.scheduler.now()
    }

    pub fn pending(&self) -> usize {
        self.context.scheduler.pending()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.context.scheduler.next_deadline()
    }

    pub fn press_count(&self, key: Key) -> u32 {
        self.context.press_count(key)
    }

    /// Takes all output edges recorded so far
    pub fn drain_output(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.context.output)
    }

    /// Takes all haptic feedback requested so far
    pub fn drain_feedback(&mut self) -> Vec<HapticData> {
        std::mem::take(&mut self.context.feedback)
    }

    /// Dispatches one button edge to its bound action.
    ///
    /// Returns whether the action handled the edge; unbound buttons are ignored.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let Some(action) = self.bindings.get_mut(&event.button) else {
            debug!("No binding for {}, ignoring {:?}", event.button, event.state);
            return false;
        };

        match event.state {
            ButtonState::Pressed => {
                if self.held_buttons.contains_key(&event.button) {
                    warn!("{} pressed twice without release", event.button);
                }
                self.held_buttons.insert(event.button, event.timestamp);
                debug!("Press {} => {}", event.button, action.describe());
                action.press(&mut self.context)
            }
            ButtonState::Released => {
                if let Some(since) = self.held_buttons.remove(&event.button) {
                    let held_for = event.timestamp - since;
                    debug!(
                        "Release {} after {}ms",
                        event.button,
                        held_for.num_milliseconds()
                    );
                }
                action.release(&mut self.context);
                true
            }
        }
    }

    /// Runs every callback due at `now`, including ones scheduled by them with zero delay
    pub fn run_due(&mut self, now: Duration) -> usize {
        let mut ran = 0;
        while let Some(callback) = self.context.scheduler.pop_due(now) {
            let ctx: &mut dyn ExecutionContext = &mut self.context;
            callback(ctx);
            ran += 1;
        }
        self.context.scheduler.advance_to(now);
        if ran > 0 {
            trace!("Ran {} scheduled callbacks", ran);
        }
        ran
    }

    /// Runs exactly one callback, jumping the clock to its deadline.
    /// Returns `false` when nothing is scheduled.
    pub fn step(&mut self) -> bool {
        match self.context.scheduler.pop_next() {
            Some(callback) => {
                let ctx: &mut dyn ExecutionContext = &mut self.context;
                callback(ctx);
                true
            }
            None => false,
        }
    }

    /// Releases every physically held button and lets in-flight runs finish.
    ///
    /// Stops after `max_steps` callbacks so a misbehaving action cannot hang shutdown.
    pub fn flush(&mut self, max_steps: usize) -> usize {
        let held: Vec<ButtonType> = self.held_buttons.keys().copied().collect();
        for button in held {
            debug!("Releasing {} for shutdown", button);
            self.handle_event(&InputEvent::new(button, ButtonState::Released));
        }

        let mut steps = 0;
        while steps < max_steps && self.step() {
            steps += 1;
        }
        if self.pending() > 0 {
            warn!(
                "{} callbacks still pending after {} steps",
                self.pending(),
                steps
            );
        }
        steps
    }
}
