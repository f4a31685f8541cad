use std::fmt;

use crate::modifier::ModifierFlags;

/// A modifier gesture that switches the input source.
///
/// `Fn` is always active. `ShiftOption` is an optional extra trigger enabled
/// through the `shortcut` setting. Each trigger is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Fn,
    ShiftOption,
}

impl Trigger {
    /// Every trigger, in evaluation order
    pub const ALL: [Trigger; 2] = [Trigger::Fn, Trigger::ShiftOption];

    /// Resolve a configured shortcut name (case-insensitive).
    pub fn from_shortcut_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "shift+option" => Some(Trigger::ShiftOption),
            _ => None,
        }
    }

    /// Whether this trigger is held in `flags`.
    ///
    /// Fn only looks at its own bit. Shift+Option requires exactly those two
    /// among the chord modifiers.
    pub fn is_held(self, flags: ModifierFlags) -> bool {
        match self {
            Trigger::Fn => flags.contains(ModifierFlags::FN),
            Trigger::ShiftOption => {
                flags.chord_bits() == (ModifierFlags::SHIFT | ModifierFlags::OPTION)
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Fn => write!(f, "Fn"),
            Trigger::ShiftOption => write!(f, "Shift+Option"),
        }
    }
}
