use serde::Serialize;

/// Why a value fell back to its default instead of being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefaultReason {
    NoCheckIn,
    NoShiftMatched,
    NoShiftRule,
}

/// A value tagged with whether it was actually derived from the data or
/// substituted because an input was missing. Callers that only want the
/// number use [`Resolution::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Defaulted { value: T, reason: DefaultReason },
}

impl<T> Resolution<T> {
    pub fn defaulted(value: T, reason: DefaultReason) -> Self {
        Resolution::Defaulted { value, reason }
    }

    pub fn value(self) -> T {
        match self {
            Resolution::Resolved(v) => v,
            Resolution::Defaulted { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<DefaultReason> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Defaulted { reason, .. } => Some(*reason),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        self.reason().is_some()
    }
}
