use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

// Button state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

macro_rules! button_names {
    ($( $variant:ident => $name:literal ),* $(,)?) => {
        // Logical gamepad buttons that bindings attach to
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ButtonType {
            $( $variant, )*
        }

        impl ButtonType {
            pub const ALL: &'static [ButtonType] = &[$( ButtonType::$variant, )*];

            pub fn name(self) -> &'static str {
                match self {
                    $( ButtonType::$variant => $name, )*
                }
            }
        }

        impl FromStr for ButtonType {
            type Err = InputError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(ButtonType::$variant), )*
                    other => Err(InputError::UnknownButton(other.to_string())),
                }
            }
        }
    };
}

button_names! {
    A => "A",
    B => "B",
    X => "X",
    Y => "Y",
    Start => "Start",
    Select => "Select",
    LeftBumper => "LeftBumper",
    RightBumper => "RightBumper",
    LeftStick => "LeftStick",
    RightStick => "RightStick",
    DPadUp => "DPadUp",
    DPadDown => "DPadDown",
    DPadLeft => "DPadLeft",
    DPadRight => "DPadRight",
    Guide => "Guide",
}

impl Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Input errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Unknown button: {0}")]
    UnknownButton(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing button in line: {0}")]
    MissingButton(String),
}

// Decoded button edge with the time it was received
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub button: ButtonType,
    pub state: ButtonState,
    pub timestamp: DateTime<Local>,
}

impl InputEvent {
    pub fn new(button: ButtonType, state: ButtonState) -> Self {
        Self {
            button,
            state,
            timestamp: Local::now(),
        }
    }
}

/// One line of the daemon's text input
#[derive(Debug, Clone)]
pub enum InputCommand {
    Button(InputEvent),
    Quit,
}

impl InputCommand {
    /// Parses `press <Button>`, `release <Button>` or `quit`.
    ///
    /// Blank lines and lines starting with `#` yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, InputError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let state = match command {
            "quit" | "exit" => return Ok(Some(InputCommand::Quit)),
            "press" => ButtonState::Pressed,
            "release" => ButtonState::Released,
            other => return Err(InputError::UnknownCommand(other.to_string())),
        };
        let button = parts
            .next()
            .ok_or_else(|| InputError::MissingButton(line.to_string()))?
            .parse::<ButtonType>()?;
        Ok(Some(InputCommand::Button(InputEvent::new(button, state))))
    }
}
