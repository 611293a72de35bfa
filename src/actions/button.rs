//! Blatt-Actions: einzelne Taste und "nichts belegt"

use crate::actions::{Action, ExecutionContext, HapticData, Key};
use tracing::debug;

/// Drückt und lässt genau eine Taste los.
///
/// Wird auch für rohe Tastenwerte verwendet, die beim Aufbau eines Macros übergeben werden.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonAction {
    key: Key,
    haptic: Option<HapticData>,
}

impl ButtonAction {
    pub fn new(key: Key) -> Self {
        Self { key, haptic: None }
    }
}

impl Action for ButtonAction {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        ctx.key_press(self.key);
        if let Some(haptic) = self.haptic {
            ctx.feedback(haptic);
        }
        true
    }

    fn release(&mut self, ctx: &mut dyn ExecutionContext) {
        ctx.key_release(self.key);
    }

    fn describe(&self) -> String {
        self.key.short_name().to_string()
    }

    fn serialize(&self) -> String {
        format!("button({})", self.key.code_name())
    }

    fn button(&self) -> Option<Key> {
        Some(self.key)
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        self.haptic = Some(haptic);
        true
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.haptic
    }
}

/// Platzhalter für einen Button ohne Belegung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoAction;

impl Action for NoAction {
    fn press(&mut self, _ctx: &mut dyn ExecutionContext) -> bool {
        debug!("Press on unbound button ignored");
        false
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {}

    fn describe(&self) -> String {
        "(not set)".to_string()
    }

    fn serialize(&self) -> String {
        "None".to_string()
    }
}
