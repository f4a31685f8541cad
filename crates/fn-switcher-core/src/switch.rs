// fn-switcher Switch Policy
// Chooses the next input source for a trigger press and commits it

use std::fmt;

use crate::layout::{Layout, LayoutList};
use crate::source::{InputSourceProvider, SourceError};

/// How a press picks the next layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchMode {
    /// Short press toggles between the two most recent layouts,
    /// long press advances to a third
    #[default]
    Mru,
    /// Every press advances through the list in order
    Cycle,
}

impl SwitchMode {
    pub fn from_cycle(cycle: bool) -> Self {
        if cycle {
            SwitchMode::Cycle
        } else {
            SwitchMode::Mru
        }
    }

    pub fn is_cycle(self) -> bool {
        self == SwitchMode::Cycle
    }
}

impl fmt::Display for SwitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchMode::Mru => write!(f, "MRU"),
            SwitchMode::Cycle => write!(f, "Cycle"),
        }
    }
}

/// Errors from committing a switch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    #[error("switch to {target} rejected: {source}")]
    CommitRejected {
        target: Layout,
        #[source]
        source: SourceError,
    },
}

/// A switch that was decided and sent to the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub from: Layout,
    pub to: Layout,
}

/// Target selection and switch history.
///
/// Owns the layout list and the most-recently-departed layout. Every
/// decision moves `previous` to the layout being left, before the commit,
/// and a rejected commit does not roll it back.
pub struct SwitchPolicyEngine<P> {
    layouts: LayoutList,
    mode: SwitchMode,
    previous: Option<Layout>,
    provider: P,
}

impl<P: InputSourceProvider> SwitchPolicyEngine<P> {
    /// Create a policy engine. History is seeded with the second layout so the
    /// first short press has somewhere to go.
    pub fn new(layouts: LayoutList, mode: SwitchMode, provider: P) -> Self {
        let previous = layouts.get(1).cloned();
        Self {
            layouts,
            mode,
            previous,
            provider,
        }
    }

    pub fn previous_layout(&self) -> Option<&Layout> {
        self.previous.as_ref()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Pick the layout to switch to from `current` and update history.
    pub fn decide(&mut self, current: &Layout, long_press: bool) -> Layout {
        let target = match self.mode {
            SwitchMode::Cycle => self.layouts.next_after(current).clone(),
            SwitchMode::Mru if long_press => self.next_skipping_previous(current).clone(),
            SwitchMode::Mru => match &self.previous {
                Some(previous) if !previous.is_empty() && previous != current => previous.clone(),
                _ => self.layouts.next_after(current).clone(),
            },
        };
        if self.mode == SwitchMode::Mru {
            self.previous = Some(current.clone());
        }
        target
    }

    /// Next layout in list order, stepping over `previous` when a third
    /// layout exists.
    fn next_skipping_previous(&self, current: &Layout) -> &Layout {
        let Some(idx) = self.layouts.position(current) else {
            return self.layouts.first();
        };
        let mut next = self.layouts.wrap_next(idx);
        if self.layouts.len() > 2 && self.layouts.get(next) == self.previous.as_ref() {
            next = self.layouts.wrap_next(next);
        }
        &self.layouts.as_slice()[next]
    }

    /// Query the active layout, decide the target and commit it.
    pub fn switch(&mut self, long_press: bool) -> Result<SwitchOutcome, SwitchError> {
        let current = match self.provider.current_layout() {
            Ok(layout) => layout,
            Err(e) => {
                log::debug!("Could not query current input source: {}", e);
                Layout::default()
            }
        };
        let target = self.decide(&current, long_press);
        log::debug!(
            "Switch decision: mode={} long_press={} {} -> {}",
            self.mode,
            long_press,
            current,
            target
        );

        self.provider
            .select_layout(&target)
            .map_err(|source| SwitchError::CommitRejected {
                target: target.clone(),
                source,
            })?;

        Ok(SwitchOutcome {
            from: current,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryInputSource;

    fn layouts(names: &[&str]) -> LayoutList {
        LayoutList::new(names.iter().map(|n| Layout::from(*n)).collect()).unwrap()
    }

    fn engine(names: &[&str], mode: SwitchMode) -> SwitchPolicyEngine<MemoryInputSource> {
        let list = layouts(names);
        let source = MemoryInputSource::new(list.as_slice().to_vec());
        SwitchPolicyEngine::new(list, mode, source)
    }

    #[test]
    fn test_history_seeded_with_second_layout() {
        let engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        assert_eq!(engine.previous_layout(), Some(&Layout::from("Y")));
    }

    #[test]
    fn test_cycle_wraps() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Cycle);
        assert_eq!(engine.decide(&"Z".into(), false), Layout::from("X"));
        assert_eq!(engine.decide(&"X".into(), true), Layout::from("Y"));
    }

    #[test]
    fn test_cycle_unknown_current_goes_to_first() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Cycle);
        assert_eq!(engine.decide(&"Q".into(), false), Layout::from("X"));
    }

    #[test]
    fn test_cycle_leaves_history_alone() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Cycle);
        engine.decide(&"X".into(), false);
        assert_eq!(engine.previous_layout(), Some(&Layout::from("Y")));
    }

    #[test]
    fn test_cycle_closes_after_full_round() {
        for len in 2..6 {
            let names: Vec<String> = (0..len).map(|i| format!("L{}", i)).collect();
            let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
            for start in 0..len {
                let mut engine = engine(&refs, SwitchMode::Cycle);
                let origin = Layout::from(refs[start]);
                let mut current = origin.clone();
                for _ in 0..len {
                    current = engine.decide(&current, false);
                }
                assert_eq!(current, origin, "len={} start={}", len, start);
            }
        }
    }

    #[test]
    fn test_mru_short_press_goes_to_previous() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        assert_eq!(engine.decide(&"X".into(), false), Layout::from("Y"));
        assert_eq!(engine.previous_layout(), Some(&Layout::from("X")));
    }

    #[test]
    fn test_mru_short_press_toggles_back() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        let first = engine.decide(&"X".into(), false);
        let second = engine.decide(&first, false);
        assert_eq!(first, Layout::from("Y"));
        assert_eq!(second, Layout::from("X"));
    }

    #[test]
    fn test_mru_short_press_previous_equals_current_advances() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        // previous is seeded to Y
        assert_eq!(engine.decide(&"Y".into(), false), Layout::from("Z"));
        assert_eq!(engine.previous_layout(), Some(&Layout::from("Y")));
    }

    #[test]
    fn test_mru_short_press_unknown_current_to_previous() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        assert_eq!(engine.decide(&"Q".into(), false), Layout::from("Y"));
        assert_eq!(engine.previous_layout(), Some(&Layout::from("Q")));
    }

    #[test]
    fn test_mru_long_press_skips_previous() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        // next after X is Y, which is previous, so skip to Z
        assert_eq!(engine.decide(&"X".into(), true), Layout::from("Z"));
        assert_eq!(engine.previous_layout(), Some(&Layout::from("X")));
    }

    #[test]
    fn test_mru_long_press_never_selects_previous() {
        let names = ["A", "B", "C", "D"];
        for current in names {
            for previous in names {
                let mut engine = engine(&names, SwitchMode::Mru);
                engine.previous = Some(previous.into());
                let target = engine.decide(&current.into(), true);
                assert_ne!(target, Layout::from(previous), "current={}", current);
            }
        }
    }

    #[test]
    fn test_mru_long_press_two_layouts_no_skip() {
        let mut engine = engine(&["X", "Y"], SwitchMode::Mru);
        assert_eq!(engine.previous_layout(), Some(&Layout::from("Y")));
        assert_eq!(engine.decide(&"X".into(), true), Layout::from("Y"));
    }

    #[test]
    fn test_mru_long_press_unknown_current_to_first() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        assert_eq!(engine.decide(&"Q".into(), true), Layout::from("X"));
    }

    #[test]
    fn test_switch_commits_through_provider() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        let outcome = engine.switch(false).unwrap();
        assert_eq!(
            outcome,
            SwitchOutcome {
                from: "X".into(),
                to: "Y".into()
            }
        );
        assert_eq!(engine.provider().current(), Layout::from("Y"));
    }

    #[test]
    fn test_switch_reads_current_fresh() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Cycle);
        engine.provider().set_current("Z");
        let outcome = engine.switch(false).unwrap();
        assert_eq!(outcome.to, Layout::from("X"));
    }

    #[test]
    fn test_rejected_commit_keeps_history() {
        let mut engine = engine(&["X", "Y", "Z"], SwitchMode::Mru);
        engine.provider().reject("Y");
        let err = engine.switch(false).unwrap_err();
        assert!(matches!(err, SwitchError::CommitRejected { ref target, .. } if target.id() == "Y"));
        assert_eq!(engine.previous_layout(), Some(&Layout::from("X")));
        assert_eq!(engine.provider().current(), Layout::from("X"));
    }

    #[test]
    fn test_switch_mode_display() {
        assert_eq!(SwitchMode::Mru.to_string(), "MRU");
        assert_eq!(SwitchMode::from_cycle(true).to_string(), "Cycle");
    }
}
