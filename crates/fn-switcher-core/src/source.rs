// Input Source Provider Trait
//
// This module defines the interface to the OS input-source service:
// querying, selecting and listing keyboard layouts.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::layout::Layout;

/// Error type for input source operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No input source with this id is installed or selectable
    NotFound(Layout),

    /// The OS refused to report or change the input source
    Unavailable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(layout) => {
                write!(f, "failed to select input source: {}", layout)
            }
            SourceError::Unavailable(msg) => write!(f, "input source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Access to the operating system's keyboard input sources.
///
/// Calls are synchronous and expected to return quickly.
pub trait InputSourceProvider: Send + Sync {
    /// Id of the currently active input source
    fn current_layout(&self) -> Result<Layout, SourceError>;

    /// Ask the OS to make `layout` the active input source
    fn select_layout(&self, layout: &Layout) -> Result<(), SourceError>;

    /// All selectable keyboard layouts, in the order the OS reports them
    fn selectable_layouts(&self) -> Result<Vec<Layout>, SourceError>;
}

impl<P: InputSourceProvider + ?Sized> InputSourceProvider for Arc<P> {
    fn current_layout(&self) -> Result<Layout, SourceError> {
        (**self).current_layout()
    }

    fn select_layout(&self, layout: &Layout) -> Result<(), SourceError> {
        (**self).select_layout(layout)
    }

    fn selectable_layouts(&self) -> Result<Vec<Layout>, SourceError> {
        (**self).selectable_layouts()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    current: Layout,
    installed: Vec<Layout>,
    rejected: HashSet<Layout>,
    selections: Vec<Layout>,
}

/// In-process input source service.
///
/// Clones share state, so a test can hand one clone to the engine and
/// inspect or steer the active layout through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryInputSource {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryInputSource {
    /// Installed layouts, with the first one active
    pub fn new(installed: Vec<Layout>) -> Self {
        let current = installed.first().cloned().unwrap_or_default();
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                current,
                installed,
                ..MemoryState::default()
            })),
        }
    }

    /// Change the active layout as if the user picked it from the menu bar
    pub fn set_current(&self, layout: impl Into<Layout>) {
        self.state.lock().current = layout.into();
    }

    pub fn current(&self) -> Layout {
        self.state.lock().current.clone()
    }

    /// Make every future selection of `layout` fail
    pub fn reject(&self, layout: impl Into<Layout>) {
        self.state.lock().rejected.insert(layout.into());
    }

    /// Every layout selection requested so far, including rejected ones
    pub fn selections(&self) -> Vec<Layout> {
        self.state.lock().selections.clone()
    }
}

impl InputSourceProvider for MemoryInputSource {
    fn current_layout(&self) -> Result<Layout, SourceError> {
        Ok(self.state.lock().current.clone())
    }

    fn select_layout(&self, layout: &Layout) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        state.selections.push(layout.clone());
        if state.rejected.contains(layout) || !state.installed.contains(layout) {
            return Err(SourceError::NotFound(layout.clone()));
        }
        state.current = layout.clone();
        Ok(())
    }

    fn selectable_layouts(&self) -> Result<Vec<Layout>, SourceError> {
        Ok(self.state.lock().installed.clone())
    }
}
