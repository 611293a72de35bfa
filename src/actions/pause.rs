//! Pause-Action: tut nichts und trägt nur Zeit bei

use crate::actions::{Action, ExecutionContext, Macro};
use std::time::Duration;

/// Wartet innerhalb eines Macros die angegebene Zeit.
///
/// Die Haltezeit des Macros läuft vor der Wartezeit ohnehin ab und wird deshalb
/// abgezogen, damit der gesamte Step genau `duration` dauert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseAction {
    duration: Duration,
}

impl PauseAction {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Action for PauseAction {
    fn press(&mut self, _ctx: &mut dyn ExecutionContext) -> bool {
        true
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {}

    fn describe(&self) -> String {
        if self.duration < Duration::from_secs(1) {
            format!("Wait {}ms", self.duration.as_millis())
        } else {
            let seconds = format!("{:.2}", self.duration.as_secs_f64());
            let seconds = seconds.trim_end_matches('0').trim_end_matches('.');
            format!("Wait {}s", seconds)
        }
    }

    fn serialize(&self) -> String {
        format!("sleep({:.3})", self.duration.as_secs_f64())
    }

    fn delay_after(&self) -> Duration {
        self.duration.saturating_sub(Macro::HOLD_TIME)
    }
}
