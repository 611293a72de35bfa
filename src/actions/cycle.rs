//! Mehrere Actions, die sich auf demselben Button abwechseln

use crate::actions::{Action, ExecutionContext, HapticData, Speed};
use tracing::debug;

/// Der erste Druck führt die erste Action aus, der zweite die zweite usw.
///
/// Ein volles Press/Release-Paar des äußeren Buttons treibt genau eine Action;
/// weitergeschaltet wird erst beim Release.
#[derive(Debug)]
pub struct Cycle {
    actions: Vec<Box<dyn Action>>,
    current: usize,
}

impl Cycle {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            actions,
            current: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }
}

impl Action for Cycle {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        match self.actions.get_mut(self.current) {
            Some(action) => action.press(ctx),
            None => {
                debug!("Press on empty cycle ignored");
                false
            }
        }
    }

    fn release(&mut self, ctx: &mut dyn ExecutionContext) {
        if self.actions.is_empty() {
            return;
        }
        self.actions[self.current].release(ctx);
        self.current = (self.current + 1) % self.actions.len();
    }

    fn describe(&self) -> String {
        "Cycle Actions".to_string()
    }

    fn serialize(&self) -> String {
        let list: Vec<String> = self.actions.iter().map(|a| a.serialize()).collect();
        format!("cycle({})", list.join(", "))
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        let mut supported = false;
        for action in &mut self.actions {
            supported |= action.set_haptic(haptic);
        }
        supported
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.actions.iter().find_map(|a| a.get_haptic())
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        let mut supported = false;
        for action in &mut self.actions {
            supported |= action.set_speed(speed);
        }
        supported
    }

    fn get_speed(&self) -> Option<Speed> {
        self.actions.iter().find_map(|a| a.get_speed())
    }
}
