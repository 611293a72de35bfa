//! Macro: mehrere Actions nacheinander, optional wiederholt
//!
//! Ein Macro besitzt eine flache Liste von [`Step`]s. Pro Lauf wird jeder Step gedrückt,
//! für die Haltezeit gehalten, losgelassen und danach `delay_after` gewartet, bevor
//! der nächste Step beginnt.
//!
//! # State Machine
//!
//! ```text
//!            press (Vorlage kopieren, erster Tick synchron)
//!   Idle ──────────────────────────────► Running
//!    ▲                                    │   ▲
//!    │ Liste leer,                   Tick │   │ Tick (release, delay_after)
//!    │ kein Repeat                        ▼   │
//!    └──────────────────────────────── Holding
//!                                  (Liste leer + repeat + aktiv: Vorlage neu laden)
//! ```
//!
//! Ein `release` des äußeren Buttons bricht einen laufenden Durchgang nie ab, es
//! verhindert nur den nächsten Neustart eines wiederholten Macros.

use crate::actions::{
    share, Action, ActionError, ButtonAction, ExecutionContext, HapticData, Key, PressAction,
    ReleaseAction, SharedAction, Speed,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Eine Action mit der Wartezeit, die nach ihrem Release eingehalten wird
#[derive(Debug, Clone)]
pub struct Step {
    pub action: SharedAction,
    pub delay_after: Duration,
}

impl Step {
    /// Erstellt einen Step mit der Standard-Wartezeit der Action
    pub fn new(action: Box<dyn Action>) -> Self {
        let delay_after = action.delay_after();
        Self {
            action: share(action),
            delay_after,
        }
    }
}

/// Parameter beim Aufbau eines Macros
#[derive(Debug)]
pub enum MacroParam {
    /// Überschreibt die Wartezeit des zuletzt angehängten Steps (Sekunden)
    Delay(f64),
    /// Eine Action; Macros werden dabei flachgeklopft
    Action(Box<dyn Action>),
    /// Rohe Taste, wird zu einer [`ButtonAction`]
    Key(Key),
}

impl From<Box<dyn Action>> for MacroParam {
    fn from(action: Box<dyn Action>) -> Self {
        MacroParam::Action(action)
    }
}

impl From<Key> for MacroParam {
    fn from(key: Key) -> Self {
        MacroParam::Key(key)
    }
}

impl From<f64> for MacroParam {
    fn from(delay: f64) -> Self {
        MacroParam::Delay(delay)
    }
}

/// Laufzustand eines Macros
#[derive(Debug, Default)]
enum RunState {
    #[default]
    Idle,
    /// Lauf aktiv, nächster Tick drückt den Kopf von `remaining`
    Running { remaining: VecDeque<Step> },
    /// `held` ist gedrückt, nächster Tick lässt ihn los
    Holding {
        remaining: VecDeque<Step>,
        held: Step,
    },
}

/// Von außen sichtbare Zusammenfassung des Laufzustands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroPhase {
    Idle,
    Running { remaining: usize },
    Holding { remaining: usize },
}

#[derive(Debug, Clone, PartialEq)]
enum MacroKind {
    Sequence,
    /// Aus Text erzeugt, hält die Buchstaben für das Textformat
    Typed(String),
}

#[derive(Debug)]
struct MacroCore {
    steps: Vec<Step>,
    repeat: bool,
    active: bool,
    hold_time: Duration,
    kind: MacroKind,
    run: RunState,
}

/// Zwei oder mehr Actions, die nacheinander ausgeführt werden.
///
/// Klone teilen sich Vorlage und Laufzustand; geplante Ticks halten nur eine
/// schwache Referenz, sodass ein verworfenes Binding seine Ticks ins Leere laufen lässt.
#[derive(Debug, Clone)]
pub struct Macro {
    core: Rc<RefCell<MacroCore>>,
}

impl Macro {
    /// Mindestdauer eines Tastendrucks innerhalb eines Macros
    pub const HOLD_TIME: Duration = Duration::from_millis(10);

    /// Haltezeit für [`Macro::typed`], das Text wiedergibt statt menschliches Timing nachzubilden
    pub const TYPE_HOLD_TIME: Duration = Duration::from_millis(1);

    /// Längste Wartezeit, die aus Text oder Zahlen angenommen wird
    pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Baut ein Macro aus einer gemischten Parameterliste.
    ///
    /// Zahlen überschreiben die Wartezeit des vorherigen Steps, Macros werden
    /// flachgeklopft, Tasten werden zu [`ButtonAction`]s.
    pub fn new(params: Vec<MacroParam>) -> Self {
        let mut steps: Vec<Step> = Vec::new();
        for param in params {
            match param {
                MacroParam::Delay(seconds) => match (steps.last_mut(), to_delay(seconds)) {
                    (Some(last), Ok(delay)) => last.delay_after = delay,
                    (None, _) => debug!("Ignoring leading delay of {}s", seconds),
                    (_, Err(e)) => warn!("Ignoring delay: {}", e),
                },
                MacroParam::Action(action) => match action.as_macro() {
                    Some(inner) => steps.extend(inner.steps()),
                    None => steps.push(Step::new(action)),
                },
                MacroParam::Key(key) => steps.push(Step::new(Box::new(ButtonAction::new(key)))),
            }
        }
        Self::from_steps(steps, Self::HOLD_TIME, MacroKind::Sequence)
    }

    /// Erzeugt ein Macro, das den Text Taste für Taste tippt.
    ///
    /// Erlaubt sind Buchstaben, Ziffern und Leerzeichen. Vor Großbuchstaben wird
    /// Shift gedrückt und erst vor dem nächsten anderen Zeichen wieder losgelassen;
    /// endet der Text groß, bleibt Shift gedrückt.
    pub fn typed(text: &str) -> Result<Self, ActionError> {
        let mut params: Vec<MacroParam> = Vec::new();
        let mut shift = false;
        for letter in text.chars() {
            let key = match letter {
                ' ' => Key::Space,
                c => Key::from_char(c).ok_or(ActionError::InvalidCharacter(c))?,
            };
            let upper = letter.is_ascii_uppercase();
            if upper && !shift {
                params.push(MacroParam::Action(Box::new(PressAction::new(Box::new(
                    ButtonAction::new(Key::LeftShift),
                )))));
                shift = true;
            } else if !upper && shift {
                params.push(MacroParam::Action(Box::new(ReleaseAction::new(Box::new(
                    ButtonAction::new(Key::LeftShift),
                )))));
                shift = false;
            }
            params.push(MacroParam::Key(key));
        }

        let steps = Self::new(params).steps();
        debug!("Generated {} steps for type('{}')", steps.len(), text);
        Ok(Self::from_steps(
            steps,
            Self::TYPE_HOLD_TIME,
            MacroKind::Typed(text.to_string()),
        ))
    }

    fn from_steps(steps: Vec<Step>, hold_time: Duration, kind: MacroKind) -> Self {
        Self {
            core: Rc::new(RefCell::new(MacroCore {
                steps,
                repeat: false,
                active: false,
                hold_time,
                kind,
                run: RunState::Idle,
            })),
        }
    }

    /// Kopie der Step-Vorlage; die Actions selbst werden geteilt
    pub fn steps(&self) -> Vec<Step> {
        self.core.borrow().steps.clone()
    }

    pub fn len(&self) -> usize {
        self.core.borrow().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.borrow().steps.is_empty()
    }

    pub fn hold_time(&self) -> Duration {
        self.core.borrow().hold_time
    }

    pub fn is_repeat(&self) -> bool {
        self.core.borrow().repeat
    }

    pub fn set_repeat(&self, repeat: bool) {
        self.core.borrow_mut().repeat = repeat;
    }

    /// Ob der äußere Button gerade gehalten wird
    pub fn is_active(&self) -> bool {
        self.core.borrow().active
    }

    pub fn phase(&self) -> MacroPhase {
        match &self.core.borrow().run {
            RunState::Idle => MacroPhase::Idle,
            RunState::Running { remaining } => MacroPhase::Running {
                remaining: remaining.len(),
            },
            RunState::Holding { remaining, .. } => MacroPhase::Holding {
                remaining: remaining.len(),
            },
        }
    }

    /// Ein Schritt der State Machine; entweder synchron aus `press` oder vom Scheduler
    fn tick(core: &Rc<RefCell<MacroCore>>, ctx: &mut dyn ExecutionContext) {
        let mut state = core.borrow_mut();
        match std::mem::take(&mut state.run) {
            RunState::Idle => {
                trace!("Tick on idle macro ignored");
            }
            RunState::Running { mut remaining } => {
                let Some(step) = remaining.pop_front() else {
                    // Nicht erreichbar: leere Läufe enden im Holding-Zweig
                    return;
                };
                let hold_time = state.hold_time;
                state.run = RunState::Holding {
                    remaining,
                    held: step.clone(),
                };
                drop(state);

                step.action.borrow_mut().press(ctx);
                Self::schedule_tick(core, hold_time, ctx);
            }
            RunState::Holding { remaining, held } => {
                let finished_delay = held.delay_after;
                let next = if !remaining.is_empty() {
                    Some(remaining)
                } else if state.repeat && state.active {
                    trace!("Restarting repeated macro");
                    Some(state.steps.iter().cloned().collect())
                } else {
                    None
                };
                let reschedule = next.is_some();
                state.run = match next {
                    Some(remaining) => RunState::Running { remaining },
                    None => RunState::Idle,
                };
                drop(state);

                held.action.borrow_mut().release(ctx);
                if reschedule {
                    Self::schedule_tick(core, finished_delay, ctx);
                } else {
                    trace!("Macro finished");
                }
            }
        }
    }

    fn schedule_tick(core: &Rc<RefCell<MacroCore>>, delay: Duration, ctx: &mut dyn ExecutionContext) {
        let weak: Weak<RefCell<MacroCore>> = Rc::downgrade(core);
        ctx.schedule(
            delay,
            Box::new(move |ctx: &mut dyn ExecutionContext| {
                if let Some(core) = weak.upgrade() {
                    Macro::tick(&core, ctx);
                } else {
                    trace!("Macro dropped before its tick");
                }
            }),
        );
    }
}

impl Action for Macro {
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool {
        {
            let mut state = self.core.borrow_mut();
            if state.steps.is_empty() {
                debug!("Press on empty macro ignored");
                return false;
            }
            state.active = true;
            if !matches!(state.run, RunState::Idle) {
                debug!("Macro already running, not starting a second run");
                return false;
            }
            let remaining: VecDeque<Step> = state.steps.iter().cloned().collect();
            state.run = RunState::Running { remaining };
        }
        Self::tick(&self.core, ctx);
        true
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {
        self.core.borrow_mut().active = false;
    }

    fn describe(&self) -> String {
        let state = self.core.borrow();
        let body = match &state.kind {
            MacroKind::Typed(letters) => format!("Type '{}'", letters),
            MacroKind::Sequence => state
                .steps
                .iter()
                .map(|step| step.action.borrow().describe())
                .collect::<Vec<_>>()
                .join("; "),
        };
        if state.repeat {
            format!("repeat {}", body)
        } else {
            body
        }
    }

    fn serialize(&self) -> String {
        let state = self.core.borrow();
        let body = match &state.kind {
            MacroKind::Typed(letters) => format!("type('{}')", letters),
            MacroKind::Sequence => {
                let mut items = Vec::with_capacity(state.steps.len());
                for step in &state.steps {
                    let action = step.action.borrow();
                    items.push(action.serialize());
                    if step.delay_after != action.delay_after() {
                        items.push(format!("{}", step.delay_after.as_secs_f64()));
                    }
                }
                items.join("; ")
            }
        };
        if state.repeat {
            format!("repeat({})", body)
        } else {
            body
        }
    }

    fn as_macro(&self) -> Option<&Macro> {
        Some(self)
    }

    fn set_haptic(&mut self, haptic: HapticData) -> bool {
        let mut supported = false;
        for step in &self.core.borrow().steps {
            supported |= step.action.borrow_mut().set_haptic(haptic);
        }
        supported
    }

    fn get_haptic(&self) -> Option<HapticData> {
        self.core
            .borrow()
            .steps
            .iter()
            .find_map(|step| step.action.borrow().get_haptic())
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        let mut supported = false;
        for step in &self.core.borrow().steps {
            supported |= step.action.borrow_mut().set_speed(speed);
        }
        supported
    }

    fn get_speed(&self) -> Option<Speed> {
        self.core
            .borrow()
            .steps
            .iter()
            .find_map(|step| step.action.borrow().get_speed())
    }
}

/// Wiederholt eine Action, solange der äußere Button gehalten wird.
///
/// Ist die Action bereits ein Macro, wird genau dieses Macro (geteilter Zustand)
/// auf Wiederholung gestellt; sonst wird sie zuerst in ein Macro verpackt.
pub fn repeat(action: Box<dyn Action>) -> Macro {
    let repeated = match action.as_macro() {
        Some(existing) => existing.clone(),
        None => Macro::new(vec![MacroParam::Action(action)]),
    };
    repeated.set_repeat(true);
    repeated
}

/// Wandelt Sekunden in eine Wartezeit; negativ, nicht endlich oder über [`Macro::MAX_DELAY`] ist ungültig
pub(crate) fn to_delay(seconds: f64) -> Result<Duration, ActionError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay <= Macro::MAX_DELAY => Ok(delay),
        _ => Err(ActionError::InvalidDelay(seconds)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::PauseAction;
    use crate::mapper::{KeyState, Mapper};
    use crate::testing::{probe, Call, CallLog};

    fn probe_macro(log: &CallLog, names: &[&'static str]) -> Macro {
        Macro::new(
            names
                .iter()
                .map(|name| MacroParam::Action(probe(log, name)))
                .collect(),
        )
    }

    #[test]
    fn run_drives_every_step_once_in_order() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = probe_macro(&log, &["a", "b", "c"]);

        assert!(m.press(mapper.context()));
        // Der erste Tick läuft synchron, die restlichen 2n - 1 über den Scheduler
        let mut scheduled_ticks = 0;
        while mapper.step() {
            scheduled_ticks += 1;
        }
        assert_eq!(scheduled_ticks, 2 * 3 - 1);
        assert_eq!(m.phase(), MacroPhase::Idle);
        assert_eq!(
            log.calls(),
            vec![
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("b"),
                Call::Release("b"),
                Call::Press("c"),
                Call::Release("c"),
            ]
        );
    }

    #[test]
    fn steps_never_overlap_and_respect_delays() {
        let mut mapper = Mapper::default();
        let mut m = Macro::new(vec![
            MacroParam::Key(Key::A),
            MacroParam::Delay(0.1),
            MacroParam::Key(Key::B),
        ]);
        m.press(mapper.context());
        while mapper.step() {}

        let edges: Vec<_> = mapper
            .drain_output()
            .into_iter()
            .map(|e| (e.key, e.state, e.offset))
            .collect();
        assert_eq!(
            edges,
            vec![
                (Key::A, KeyState::Pressed, Duration::ZERO),
                (Key::A, KeyState::Released, Duration::from_millis(10)),
                (Key::B, KeyState::Pressed, Duration::from_millis(110)),
                (Key::B, KeyState::Released, Duration::from_millis(120)),
            ]
        );
    }

    #[test]
    fn press_while_running_leaves_run_state_alone() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = probe_macro(&log, &["a", "b"]);

        m.press(mapper.context());
        assert_eq!(m.phase(), MacroPhase::Holding { remaining: 1 });
        assert!(!m.press(mapper.context()));
        assert_eq!(m.phase(), MacroPhase::Holding { remaining: 1 });
        assert_eq!(mapper.pending(), 1);

        while mapper.step() {}
        assert_eq!(log.calls().len(), 4);
    }

    #[test]
    fn release_does_not_truncate_run() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = probe_macro(&log, &["a", "b", "c"]);

        m.press(mapper.context());
        m.release(mapper.context());
        assert!(!m.is_active());
        while mapper.step() {}

        assert_eq!(log.calls().len(), 6);
        assert_eq!(m.phase(), MacroPhase::Idle);
    }

    #[test]
    fn empty_macro_is_not_handled() {
        let mut mapper = Mapper::default();
        let mut m = Macro::new(Vec::new());
        assert!(!m.press(mapper.context()));
        assert_eq!(mapper.pending(), 0);
        assert_eq!(m.phase(), MacroPhase::Idle);
    }

    #[test]
    fn nested_macros_are_flattened() {
        let inner = Macro::new(vec![MacroParam::Key(Key::A), MacroParam::Key(Key::B)]);
        inner.set_repeat(true);
        let outer = Macro::new(vec![
            MacroParam::Action(Box::new(inner)),
            MacroParam::Key(Key::C),
        ]);
        assert_eq!(outer.len(), 3);
        assert!(!outer.is_repeat());
        assert_eq!(
            outer.serialize(),
            "button(KEY_A); button(KEY_B); button(KEY_C)"
        );
    }

    #[test]
    fn leading_delay_is_ignored() {
        let m = Macro::new(vec![MacroParam::Delay(0.5), MacroParam::Key(Key::A)]);
        let steps = m.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].delay_after, Macro::HOLD_TIME);
    }

    #[test]
    fn repeat_restarts_while_active() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = repeat(probe(&log, "a"));
        // Pause zwischen den Wiederholungen = delay_after des letzten Steps
        assert_eq!(m.steps()[0].delay_after, Macro::HOLD_TIME);

        m.press(mapper.context());
        for _ in 0..7 {
            assert!(mapper.step());
        }
        assert_eq!(
            log.calls(),
            vec![
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("a"),
                Call::Release("a"),
            ]
        );
        assert_eq!(mapper.now(), Duration::from_millis(70));
        assert!(mapper.pending() > 0);
    }

    #[test]
    fn release_during_final_hold_suppresses_restart() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = repeat(Box::new(Macro::new(vec![
            MacroParam::Action(probe(&log, "a")),
            MacroParam::Action(probe(&log, "b")),
            MacroParam::Delay(0.2),
        ])));

        m.press(mapper.context());
        mapper.step(); // release a
        mapper.step(); // press b
        assert_eq!(m.phase(), MacroPhase::Holding { remaining: 0 });

        m.release(mapper.context());
        assert!(mapper.step()); // release b fires anyway
        assert!(!mapper.step());
        assert_eq!(m.phase(), MacroPhase::Idle);
        assert_eq!(log.calls().last(), Some(&Call::Release("b")));
        assert_eq!(log.calls().len(), 4);
    }

    #[test]
    fn press_after_release_keeps_repeat_running() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = repeat(Box::new(probe_macro(&log, &["a", "b"])));

        m.press(mapper.context());
        m.release(mapper.context());
        assert!(!m.is_active());
        assert!(!m.press(mapper.context()));
        assert!(m.is_active());
        assert_eq!(m.phase(), MacroPhase::Holding { remaining: 1 });

        for _ in 0..3 {
            assert!(mapper.step());
        }
        // Neu gestartet, weil der zweite Druck active wieder gesetzt hat
        assert_eq!(m.phase(), MacroPhase::Running { remaining: 2 });
        assert!(mapper.step());
        assert_eq!(
            log.calls(),
            vec![
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("b"),
                Call::Release("b"),
                Call::Press("a"),
            ]
        );

        m.release(mapper.context());
        while mapper.step() {}
        assert_eq!(m.phase(), MacroPhase::Idle);
        assert_eq!(log.calls().len(), 8);
    }

    #[test]
    fn press_after_finished_run_starts_fresh_run() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = probe_macro(&log, &["a"]);

        assert!(m.press(mapper.context()));
        m.release(mapper.context());
        while mapper.step() {}
        assert_eq!(m.phase(), MacroPhase::Idle);

        assert!(m.press(mapper.context()));
        assert_eq!(m.phase(), MacroPhase::Holding { remaining: 0 });
        while mapper.step() {}
        assert_eq!(
            log.calls(),
            vec![
                Call::Press("a"),
                Call::Release("a"),
                Call::Press("a"),
                Call::Release("a"),
            ]
        );
    }

    #[test]
    fn out_of_range_delay_is_ignored() {
        let m = Macro::new(vec![
            MacroParam::Key(Key::A),
            MacroParam::Delay(1e19),
            MacroParam::Key(Key::B),
            MacroParam::Delay(-1.0),
        ]);
        assert!(m.steps().iter().all(|step| step.delay_after == Macro::HOLD_TIME));
        assert_eq!(to_delay(86_400.0), Ok(Macro::MAX_DELAY));
        assert_eq!(to_delay(86_400.5), Err(ActionError::InvalidDelay(86_400.5)));
    }

    #[test]
    fn repeat_uses_finishing_step_delay() {
        let mut mapper = Mapper::default();
        let mut m = repeat(Box::new(Macro::new(vec![
            MacroParam::Key(Key::A),
            MacroParam::Delay(0.05),
            MacroParam::Key(Key::B),
            MacroParam::Delay(0.3),
        ])));
        m.press(mapper.context());
        for _ in 0..3 {
            mapper.step();
        }
        assert_eq!(mapper.now(), Duration::from_millis(70));
        mapper.step(); // zweiter Durchgang startet
        assert_eq!(mapper.now(), Duration::from_millis(370));
    }

    #[test]
    fn repeat_of_macro_shares_the_instance() {
        let m = Macro::new(vec![MacroParam::Key(Key::A)]);
        let repeated = repeat(Box::new(m.clone()));
        assert!(m.is_repeat());
        assert!(repeated.is_repeat());
        assert_eq!(repeated.serialize(), "repeat(button(KEY_A))");
        assert_eq!(repeated.describe(), "repeat A");
    }

    #[test]
    fn pause_pads_cycle_to_requested_duration() {
        let mut mapper = Mapper::default();
        let mut m = Macro::new(vec![
            MacroParam::Key(Key::A),
            MacroParam::Action(Box::new(PauseAction::new(Duration::from_millis(500)))),
            MacroParam::Key(Key::B),
        ]);
        m.press(mapper.context());
        while mapper.step() {}
        let b_press = mapper
            .drain_output()
            .into_iter()
            .find(|e| e.key == Key::B && e.state == KeyState::Pressed)
            .map(|e| e.offset);
        // A: 10ms halten + 10ms Pause, Sleep: 10ms halten + 490ms
        assert_eq!(b_press, Some(Duration::from_millis(520)));
    }

    #[test]
    fn typed_string_generates_shifted_steps() {
        let m = Macro::typed("Ab 1").unwrap();
        let serialized: Vec<String> = m
            .steps()
            .iter()
            .map(|step| step.action.borrow().serialize())
            .collect();
        assert_eq!(
            serialized,
            vec![
                "press(button(KEY_LEFTSHIFT))",
                "button(KEY_A)",
                "release(button(KEY_LEFTSHIFT))",
                "button(KEY_B)",
                "button(KEY_SPACE)",
                "button(KEY_1)",
            ]
        );
        assert_eq!(m.hold_time(), Macro::TYPE_HOLD_TIME);
        assert_eq!(m.serialize(), "type('Ab 1')");
        assert_eq!(m.describe(), "Type 'Ab 1'");
    }

    #[test]
    fn typed_string_ending_uppercase_has_no_trailing_release() {
        let m = Macro::typed("OK").unwrap();
        let last = m.steps().last().map(|s| s.action.borrow().serialize());
        assert_eq!(last.as_deref(), Some("button(KEY_K)"));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn typed_string_rejects_unsupported_characters() {
        assert_eq!(
            Macro::typed("ab#c").unwrap_err(),
            ActionError::InvalidCharacter('#')
        );
    }

    #[test]
    fn typed_string_output_on_device() {
        let mut mapper = Mapper::default();
        let mut m = Macro::typed("Hi").unwrap();
        m.press(mapper.context());
        while mapper.step() {}
        let edges: Vec<_> = mapper
            .drain_output()
            .into_iter()
            .map(|e| (e.key, e.state))
            .collect();
        assert_eq!(
            edges,
            vec![
                (Key::LeftShift, KeyState::Pressed),
                (Key::H, KeyState::Pressed),
                (Key::H, KeyState::Released),
                (Key::LeftShift, KeyState::Released),
                (Key::I, KeyState::Pressed),
                (Key::I, KeyState::Released),
            ]
        );
    }

    #[test]
    fn dropped_macro_cancels_pending_ticks() {
        let log = CallLog::default();
        let mut mapper = Mapper::default();
        let mut m = probe_macro(&log, &["a", "b"]);
        m.press(mapper.context());
        drop(m);
        while mapper.step() {}
        assert_eq!(log.calls(), vec![Call::Press("a")]);
    }

    #[test]
    fn haptic_and_speed_pass_through_to_first_capable_child() {
        let log = CallLog::default();
        let mut m = Macro::new(vec![
            MacroParam::Action(Box::new(PauseAction::new(Duration::from_millis(5)))),
            MacroParam::Action(probe(&log, "a")),
            MacroParam::Key(Key::A),
        ]);
        assert_eq!(m.get_speed(), None);
        assert!(m.set_speed((2.0, 1.0, 1.0)));
        assert_eq!(m.get_speed(), Some((2.0, 1.0, 1.0)));

        assert_eq!(m.get_haptic(), None);
        let haptic = HapticData {
            amplitude: 100,
            ..Default::default()
        };
        assert!(m.set_haptic(haptic));
        assert_eq!(m.get_haptic(), Some(haptic));
    }
}
