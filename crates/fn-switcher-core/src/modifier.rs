// fn-switcher Modifier Flags
// Raw modifier bitmask of a flags-changed event and press/release edge detection

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Snapshot of the modifier keys held at the moment of an event.
///
/// The bit values match `CGEventFlags` on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ModifierFlags(pub u64);

impl ModifierFlags {
    pub const NONE: ModifierFlags = ModifierFlags(0);
    pub const CAPS_LOCK: ModifierFlags = ModifierFlags(0x0001_0000);
    pub const SHIFT: ModifierFlags = ModifierFlags(0x0002_0000);
    pub const CONTROL: ModifierFlags = ModifierFlags(0x0004_0000);
    pub const OPTION: ModifierFlags = ModifierFlags(0x0008_0000);
    pub const COMMAND: ModifierFlags = ModifierFlags(0x0010_0000);
    pub const NUMERIC_PAD: ModifierFlags = ModifierFlags(0x0020_0000);
    pub const FN: ModifierFlags = ModifierFlags(0x0080_0000);

    /// Modifiers that take part in chord matching.
    ///
    /// Caps Lock and the numeric-pad bit are left out so they never block a chord.
    pub const CHORD_MASK: ModifierFlags = ModifierFlags(
        Self::SHIFT.0 | Self::CONTROL.0 | Self::OPTION.0 | Self::COMMAND.0 | Self::FN.0,
    );

    pub fn bits(self) -> u64 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub fn contains(self, other: ModifierFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Only the bits that take part in chord matching
    pub fn chord_bits(self) -> ModifierFlags {
        self & Self::CHORD_MASK
    }
}

impl From<u64> for ModifierFlags {
    fn from(bits: u64) -> Self {
        ModifierFlags(bits)
    }
}

impl BitOr for ModifierFlags {
    type Output = ModifierFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ModifierFlags(self.0 | rhs.0)
    }
}

impl BitAnd for ModifierFlags {
    type Output = ModifierFlags;

    fn bitand(self, rhs: Self) -> Self::Output {
        ModifierFlags(self.0 & rhs.0)
    }
}

impl fmt::Display for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ModifierFlags, &str); 7] = [
            (ModifierFlags::CAPS_LOCK, "CapsLock"),
            (ModifierFlags::SHIFT, "Shift"),
            (ModifierFlags::CONTROL, "Control"),
            (ModifierFlags::OPTION, "Option"),
            (ModifierFlags::COMMAND, "Command"),
            (ModifierFlags::NUMERIC_PAD, "NumPad"),
            (ModifierFlags::FN, "Fn"),
        ];
        let held: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if held.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", held.join("+"))
        }
    }
}

/// Transition of a single trigger between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
    Unchanged,
}

/// Edge detector for one trigger.
///
/// Remembers whether the trigger was held at the previous snapshot and
/// reports press/release edges as new snapshots arrive.
#[derive(Debug, Clone, Default)]
pub struct ModifierStateTracker {
    pressed: bool,
}

impl ModifierStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the new pressed state and report the edge it produced.
    pub fn update(&mut self, now_pressed: bool) -> Edge {
        let edge = match (self.pressed, now_pressed) {
            (false, true) => Edge::Pressed,
            (true, false) => Edge::Released,
            _ => Edge::Unchanged,
        };
        self.pressed = now_pressed;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_mask_excludes_caps_and_numpad() {
        let flags = ModifierFlags::SHIFT | ModifierFlags::CAPS_LOCK | ModifierFlags::NUMERIC_PAD;
        assert_eq!(flags.chord_bits(), ModifierFlags::SHIFT);
    }

    #[test]
    fn test_contains() {
        let flags = ModifierFlags::SHIFT | ModifierFlags::OPTION;
        assert!(flags.contains(ModifierFlags::SHIFT));
        assert!(flags.contains(ModifierFlags::SHIFT | ModifierFlags::OPTION));
        assert!(!flags.contains(ModifierFlags::FN));
    }

    #[test]
    fn test_display() {
        assert_eq!(ModifierFlags::NONE.to_string(), "none");
        assert_eq!(
            (ModifierFlags::FN | ModifierFlags::SHIFT).to_string(),
            "Shift+Fn"
        );
    }

    #[test]
    fn test_tracker_edges() {
        let mut tracker = ModifierStateTracker::new();
        assert_eq!(tracker.update(false), Edge::Unchanged);
        assert_eq!(tracker.update(true), Edge::Pressed);
        assert_eq!(tracker.update(true), Edge::Unchanged);
        assert_eq!(tracker.update(false), Edge::Released);
        assert_eq!(tracker.update(false), Edge::Unchanged);
    }
}
