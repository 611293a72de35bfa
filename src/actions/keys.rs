//! Tabelle aller Tasten und Buttons, die eine Action auf dem virtuellen Gerät auslösen kann.
//!
//! Jede Taste hat einen kanonischen Namen im evdev-Stil (`KEY_A`, `BTN_SOUTH`),
//! der im Textformat der Actions verwendet wird, sowie einen kurzen Anzeigenamen.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::actions::ActionError;

macro_rules! key_table {
    ($( $variant:ident => $code:literal, $short:literal; )*) => {
        /// Tasten und Buttons des virtuellen Ausgabegeräts
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $( $variant, )*
        }

        impl Key {
            /// Alle bekannten Tasten in Tabellenreihenfolge
            pub const ALL: &'static [Key] = &[$( Key::$variant, )*];

            /// Kanonischer Name, z.B. `KEY_A`
            pub fn code_name(self) -> &'static str {
                match self {
                    $( Key::$variant => $code, )*
                }
            }

            /// Kurzer Anzeigename für `describe()`
            pub fn short_name(self) -> &'static str {
                match self {
                    $( Key::$variant => $short, )*
                }
            }

            /// Sucht eine Taste über ihren kanonischen Namen
            pub fn from_code_name(name: &str) -> Option<Key> {
                match name {
                    $( $code => Some(Key::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

key_table! {
    A => "KEY_A", "A";
    B => "KEY_B", "B";
    C => "KEY_C", "C";
    D => "KEY_D", "D";
    E => "KEY_E", "E";
    F => "KEY_F", "F";
    G => "KEY_G", "G";
    H => "KEY_H", "H";
    I => "KEY_I", "I";
    J => "KEY_J", "J";
    K => "KEY_K", "K";
    L => "KEY_L", "L";
    M => "KEY_M", "M";
    N => "KEY_N", "N";
    O => "KEY_O", "O";
    P => "KEY_P", "P";
    Q => "KEY_Q", "Q";
    R => "KEY_R", "R";
    S => "KEY_S", "S";
    T => "KEY_T", "T";
    U => "KEY_U", "U";
    V => "KEY_V", "V";
    W => "KEY_W", "W";
    X => "KEY_X", "X";
    Y => "KEY_Y", "Y";
    Z => "KEY_Z", "Z";
    Num0 => "KEY_0", "0";
    Num1 => "KEY_1", "1";
    Num2 => "KEY_2", "2";
    Num3 => "KEY_3", "3";
    Num4 => "KEY_4", "4";
    Num5 => "KEY_5", "5";
    Num6 => "KEY_6", "6";
    Num7 => "KEY_7", "7";
    Num8 => "KEY_8", "8";
    Num9 => "KEY_9", "9";
    Space => "KEY_SPACE", "Space";
    Enter => "KEY_ENTER", "Enter";
    Esc => "KEY_ESC", "Esc";
    Tab => "KEY_TAB", "Tab";
    Backspace => "KEY_BACKSPACE", "Backspace";
    LeftShift => "KEY_LEFTSHIFT", "LShift";
    RightShift => "KEY_RIGHTSHIFT", "RShift";
    LeftCtrl => "KEY_LEFTCTRL", "LCtrl";
    RightCtrl => "KEY_RIGHTCTRL", "RCtrl";
    LeftAlt => "KEY_LEFTALT", "LAlt";
    RightAlt => "KEY_RIGHTALT", "RAlt";
    Up => "KEY_UP", "Up";
    Down => "KEY_DOWN", "Down";
    Left => "KEY_LEFT", "Left";
    Right => "KEY_RIGHT", "Right";
    F1 => "KEY_F1", "F1";
    F2 => "KEY_F2", "F2";
    F3 => "KEY_F3", "F3";
    F4 => "KEY_F4", "F4";
    F5 => "KEY_F5", "F5";
    F6 => "KEY_F6", "F6";
    F7 => "KEY_F7", "F7";
    F8 => "KEY_F8", "F8";
    F9 => "KEY_F9", "F9";
    F10 => "KEY_F10", "F10";
    F11 => "KEY_F11", "F11";
    F12 => "KEY_F12", "F12";
    MouseLeft => "BTN_LEFT", "Mouse Left";
    MouseRight => "BTN_RIGHT", "Mouse Right";
    MouseMiddle => "BTN_MIDDLE", "Mouse Middle";
    PadSouth => "BTN_SOUTH", "Pad A";
    PadEast => "BTN_EAST", "Pad B";
    PadNorth => "BTN_NORTH", "Pad Y";
    PadWest => "BTN_WEST", "Pad X";
    PadStart => "BTN_START", "Pad Start";
    PadSelect => "BTN_SELECT", "Pad Select";
    PadMode => "BTN_MODE", "Pad Guide";
    PadLeftBumper => "BTN_TL", "Pad LB";
    PadRightBumper => "BTN_TR", "Pad RB";
    PadLeftStick => "BTN_THUMBL", "Pad LS";
    PadRightStick => "BTN_THUMBR", "Pad RS";
}

impl Key {
    /// Liefert die Taste für einen Buchstaben oder eine Ziffer.
    ///
    /// Groß- und Kleinbuchstaben landen auf derselben Taste; Shift ist Sache des Aufrufers.
    pub fn from_char(c: char) -> Option<Key> {
        if !c.is_ascii_alphanumeric() {
            return None;
        }
        Key::from_code_name(&format!("KEY_{}", c.to_ascii_uppercase()))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_name())
    }
}

impl FromStr for Key {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_code_name(s).ok_or_else(|| ActionError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_names_are_unique() {
        for key in Key::ALL {
            assert_eq!(Key::from_code_name(key.code_name()), Some(*key));
        }
    }

    #[test]
    fn chars_map_to_letter_and_digit_keys() {
        assert_eq!(Key::from_char('a'), Some(Key::A));
        assert_eq!(Key::from_char('Q'), Some(Key::Q));
        assert_eq!(Key::from_char('7'), Some(Key::Num7));
        assert_eq!(Key::from_char(' '), None);
        assert_eq!(Key::from_char('#'), None);
        assert_eq!(Key::from_char('ä'), None);
    }

    #[test]
    fn parse_unknown_key_fails() {
        assert_eq!("KEY_SPACE".parse::<Key>().unwrap(), Key::Space);
        assert!(matches!(
            "KEY_NOPE".parse::<Key>(),
            Err(ActionError::UnknownKey(name)) if name == "KEY_NOPE"
        ));
    }
}
