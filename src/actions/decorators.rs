//! Dekoratoren, die eine Flanke der inneren Action umdeuten
//!
//! - [`PressAction`] drückt und lässt gedrückt, ergibt nur innerhalb eines Macros Sinn
//! - [`ReleaseAction`] beendet einen mit [`PressAction`] begonnenen Druck
//! - [`TapAction`] drückt kurz, auch wenn die Taste bereits gehalten wird

use crate::actions::{Action, ExecutionContext, HapticData, Speed};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Drückt die innere Action und lässt sie gedrückt
#[derive(Debug)]
pub struct PressAction {
    inner: Box<dyn Action>,
}

impl PressAction {
    pub fn new(inner: Box<dyn Action>) -> Self {
        Self { inner }
    }
}

impl Action for PressAction {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        self.inner.press(ctx)
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {
        // Wird nur durch den Druck ausgelöst
    }

    fn describe(&self) -> String {
        format!("Press {}", self.inner.describe())
    }

    fn serialize(&self) -> String {
        format!("press({})", self.inner.serialize())
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        self.inner.set_haptic(haptic)
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.inner.get_haptic()
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        self.inner.set_speed(speed)
    }

    fn get_speed(&self) -> Option<Speed> {
        self.inner.get_speed()
    }
}

/// Löst beim Drücken die Release-Flanke der inneren Action aus
#[derive(Debug)]
pub struct ReleaseAction {
    inner: Box<dyn Action>,
}

impl ReleaseAction {
    pub fn new(inner: Box<dyn Action>) -> Self {
        Self { inner }
    }
}

impl Action for ReleaseAction {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        self.inner.release(ctx);
        true
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {}

    fn describe(&self) -> String {
        format!("Release {}", self.inner.describe())
    }

    fn serialize(&self) -> String {
        format!("release({})", self.inner.serialize())
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        self.inner.set_haptic(haptic)
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.inner.get_haptic()
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        self.inner.set_speed(speed)
    }

    fn get_speed(&self) -> Option<Speed> {
        self.inner.get_speed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Press,
    Release,
}

#[derive(Debug)]
struct TapCore {
    inner: Box<dyn Action>,
    pending: VecDeque<Edge>,
}

/// Drückt die innere Action kurz.
///
/// Ist die Taste bereits gedrückt, entsteht eine neue saubere Press-Flanke durch
/// die Folge release, press, release, press, ein Element pro Scheduler-Durchlauf.
/// Solange diese Folge noch läuft, wird ein weiterer Druck ignoriert.
#[derive(Debug)]
pub struct TapAction {
    core: Rc<RefCell<TapCore>>,
}

impl TapAction {
    /// Folge für eine bereits gehaltene Taste
    const RETAP: [Edge; 4] = [Edge::Release, Edge::Press, Edge::Release, Edge::Press];

    pub fn new(inner: Box<dyn Action>) -> Self {
        Self {
            core: Rc::new(RefCell::new(TapCore {
                inner,
                pending: VecDeque::new(),
            })),
        }
    }

    fn schedule_edge(core: &Rc<RefCell<TapCore>>, ctx: &mut dyn ExecutionContext) {
        let weak: Weak<RefCell<TapCore>> = Rc::downgrade(core);
        ctx.schedule(
            Duration::ZERO,
            Box::new(move |ctx: &mut dyn ExecutionContext| {
                if let Some(core) = weak.upgrade() {
                    TapAction::apply_next_edge(&core, ctx);
                }
            }),
        );
    }

    fn apply_next_edge(core: &Rc<RefCell<TapCore>>, ctx: &mut dyn ExecutionContext) {
        let more = {
            let mut state = core.borrow_mut();
            let Some(edge) = state.pending.pop_front() else {
                return;
            };
            trace!("Tap edge {:?}", edge);
            match edge {
                Edge::Press => {
                    state.inner.press(ctx);
                }
                Edge::Release => state.inner.release(ctx),
            }
            !state.pending.is_empty()
        };
        if more {
            Self::schedule_edge(core, ctx);
        }
    }
}

impl Action for TapAction {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        let mut state = self.core.borrow_mut();
        if !state.pending.is_empty() {
            debug!("Tap still in progress, press ignored");
            return false;
        }
        let held = state
            .inner
            .button()
            .is_some_and(|key| ctx.is_button_logically_held(key));

        let handled = if held {
            debug!("Tap on held button, generating release-press sequence");
            state.pending = Self::RETAP.into_iter().collect();
            true
        } else {
            state.pending = VecDeque::from([Edge::Release]);
            state.inner.press(ctx)
        };
        drop(state);
        Self::schedule_edge(&self.core, ctx);
        handled
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {
        // Das Loslassen des äußeren Buttons spielt für einen Tap keine Rolle
    }

    fn describe(&self) -> String {
        format!("Tap {}", self.core.borrow().inner.describe())
    }

    fn serialize(&self) -> String {
        format!("tap({})", self.core.borrow().inner.serialize())
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        self.core.borrow_mut().inner.set_haptic(haptic)
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.core.borrow().inner.get_haptic()
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        self.core.borrow_mut().inner.set_speed(speed)
    }

    fn get_speed(&self) -> Option<Speed> {
        self.core.borrow().inner.get_speed()
    }
}
