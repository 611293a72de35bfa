//! Modul für zeitgesteuerte Actions, die an logische Buttons gebunden werden.
//!
//! Eine [`Action`] reagiert auf die Press- und Release-Flanken eines Buttons. Einfache
//! Actions lösen direkt einen Tastendruck aus, zusammengesetzte Actions ([`Macro`],
//! [`Cycle`]) und Dekoratoren ([`PressAction`], [`ReleaseAction`], [`TapAction`])
//! steuern ihre Kinder über einen kooperativen Scheduler.
//!
//! # Ablauf
//!
//! ```text
//! Button-Flanke ──► Action::press/release ──► ExecutionContext
//!                          │                    │        │
//!                          │               key_press  schedule(delay, callback)
//!                          ▼                             │
//!                   Kind-Actions  ◄──── Tick ◄───────────┘
//! ```
//!
//! Alles läuft auf einer einzigen Event-Loop. Ein Tick blockiert nie, Wartezeiten
//! werden ausschließlich als zukünftige Callbacks registriert.

pub mod button;
pub mod cycle;
pub mod decorators;
pub mod error;
pub mod keys;
pub mod macros;
pub mod parser;
pub mod pause;

pub use button::{ButtonAction, NoAction};
pub use cycle::Cycle;
pub use decorators::{PressAction, ReleaseAction, TapAction};
pub use error::ActionError;
pub use keys::Key;
pub use macros::{repeat, Macro, MacroParam, MacroPhase, Step};
pub use parser::parse;
pub use pause::PauseAction;

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::time::Duration;

/// Callback, der vom Scheduler genau einmal mit dem Ausführungskontext aufgerufen wird
pub type Callback = Box<dyn FnOnce(&mut dyn ExecutionContext)>;

/// Geteilter Zugriff auf eine Action, damit geplante Ticks sie erreichen können
pub type SharedAction = Rc<RefCell<Box<dyn Action>>>;

/// Geschwindigkeitsfaktoren für die drei Achsen einer Action
pub type Speed = (f64, f64, f64);

/// Packt eine Action in einen [`SharedAction`]-Handle
pub fn share(action: Box<dyn Action>) -> SharedAction {
    Rc::new(RefCell::new(action))
}

/// Seite des Controllers, auf der haptisches Feedback ausgegeben wird
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HapticPosition {
    Left,
    Right,
    #[default]
    Both,
}

/// Parameter für haptisches Feedback beim Auslösen einer Action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HapticData {
    pub position: HapticPosition,
    pub amplitude: u16,
    pub frequency: u16,
    pub period: u16,
}

/// Schnittstelle des Dispatchers, die Actions während press/release sehen.
///
/// Der Dispatcher besitzt Scheduler und Tastentabelle; Actions greifen nie
/// direkt auf Gerätezustand zu, sondern nur über diesen Kontext.
pub trait ExecutionContext {
    /// Registriert `callback`, der einmalig nach `delay` auf der Event-Loop läuft.
    /// Callbacks mit gleicher Deadline laufen in Registrierungsreihenfolge.
    fn schedule(&mut self, delay: Duration, callback: Callback);

    /// Prüft, ob die Taste laut Tastentabelle gerade gedrückt ist
    fn is_button_logically_held(&self, key: Key) -> bool;

    /// Drückt eine Taste auf dem virtuellen Gerät
    fn key_press(&mut self, key: Key);

    /// Lässt eine Taste auf dem virtuellen Gerät los
    fn key_release(&mut self, key: Key);

    /// Gibt haptisches Feedback aus
    fn feedback(&mut self, _haptic: HapticData) {}
}

/// Gemeinsamer Vertrag aller Actions
pub trait Action: Debug {
    /// Löst die Press-Flanke aus. Gibt `false` zurück, wenn nichts passiert ist.
    fn press(&mut self, ctx: &mut dyn ExecutionContext) -> bool;

    /// Löst die Release-Flanke aus
    fn release(&mut self, ctx: &mut dyn ExecutionContext);

    /// Menschenlesbare Zusammenfassung
    fn describe(&self) -> String;

    /// Kanonisches Textformat, das [`parse`] wieder einlesen kann
    fn serialize(&self) -> String;

    /// Standard-Wartezeit nach dieser Action, wenn sie als Step in einem Macro steht
    fn delay_after(&self) -> Duration {
        Macro::HOLD_TIME
    }

    /// Taste, die diese Action drückt, falls es genau eine gibt
    fn button(&self) -> Option<Key> {
        None
    }

    /// Zugriff auf das Macro, falls diese Action eines ist (für Flattening und `repeat`)
    fn as_macro(&self) -> Option<&Macro> {
        None
    }

    /// Setzt haptisches Feedback. Gibt `false` zurück, wenn die Action es nicht unterstützt.
    fn set_haptic(&mut self, _haptic: HapticData) -> bool {
        false
    }

    fn get_haptic(&self) -> Option<HapticData> {
        None
    }

    /// Setzt Geschwindigkeitsfaktoren. Gibt `false` zurück, wenn die Action sie nicht unterstützt.
    fn set_speed(&mut self, _speed: Speed) -> bool {
        false
    }

    fn get_speed(&self) -> Option<Speed> {
        None
    }
}
