//! Controller input as seen by the action core
//!
//! The hardware decoding layer is not part of this crate. Button edges arrive as
//! already-decoded [`InputEvent`]s, either from text lines (`press A`) or from
//! whatever upstream producer owns the physical device.
//!
//! ```text
//! Upstream ──► InputEvent ──► Mapper ──► Action::press/release
//! ```

pub mod input;

pub use input::{ButtonState, ButtonType, InputCommand, InputError, InputEvent};
