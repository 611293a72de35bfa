//! Fehlerdefinitionen für das Actions-Modul

use thiserror::Error;

/// Fehler beim Aufbau oder Parsen einer Action.
///
/// Alle Varianten entstehen beim Erstellen eines Bindings, nie zur Laufzeit:
/// ein fehlerhaftes Binding wird abgelehnt, bevor es einem Button zugeordnet wird.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// Zeichen, das `type()` nicht tippen kann
    #[error("Ungültiges Zeichen für type(): '{0}'")]
    InvalidCharacter(char),

    /// Tastenname, der in der Tastentabelle fehlt
    #[error("Unbekannte Taste: {0}")]
    UnknownKey(String),

    /// Befehl, den der Parser nicht kennt
    #[error("Unbekannter Befehl: {0}")]
    UnknownCommand(String),

    /// Syntaxfehler im Textformat
    #[error("Parserfehler an Position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Ungültige Zeitangabe (negativ, unendlich oder zu groß)
    #[error("Ungültige Verzögerung: {0}")]
    InvalidDelay(f64),
}
