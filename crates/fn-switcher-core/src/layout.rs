// fn-switcher Layouts
// Input source identifiers and the ordered list the switcher walks

use std::fmt;

/// Namespace every keyboard layout id lives under on macOS.
pub const KEYLAYOUT_PREFIX: &str = "com.apple.keylayout.";

/// An input source identifier, e.g. `com.apple.keylayout.ABC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Layout(String);

impl Layout {
    pub fn new(id: impl Into<String>) -> Self {
        Layout(id.into())
    }

    /// Build a layout from a user-supplied short name.
    ///
    /// Surrounding whitespace is trimmed and the keylayout prefix is added
    /// unless the name already carries it. Returns `None` for blank input.
    pub fn from_short_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if name.starts_with(KEYLAYOUT_PREFIX) {
            Some(Layout(name.to_string()))
        } else {
            Some(Layout(format!("{}{}", KEYLAYOUT_PREFIX, name)))
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// The id without the keylayout prefix, as written in the config file.
    pub fn short_name(&self) -> &str {
        self.0.strip_prefix(KEYLAYOUT_PREFIX).unwrap_or(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Layout {
    fn from(id: &str) -> Self {
        Layout(id.to_string())
    }
}

impl From<String> for Layout {
    fn from(id: String) -> Self {
        Layout(id)
    }
}

/// Normalize a sequence of short names into layout ids.
///
/// Blank entries are dropped.
pub fn normalize_layouts<I, S>(raw: I) -> Vec<Layout>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|name| Layout::from_short_name(name.as_ref()))
        .collect()
}

/// Split a comma-separated list (CLI flag or environment value) and normalize it.
pub fn parse_layout_list(value: &str) -> Vec<Layout> {
    normalize_layouts(value.split(','))
}

/// Error building a [`LayoutList`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("need at least 2 keyboard layouts to switch between, got {0}")]
pub struct TooFewLayouts(pub usize);

/// Ordered set of layouts to switch between.
///
/// Holds at least two unique entries; order defines the cycle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutList {
    layouts: Vec<Layout>,
}

impl LayoutList {
    /// Minimum number of layouts the switcher can operate on
    pub const MIN_LEN: usize = 2;

    /// Build a list, dropping repeated entries (first occurrence wins).
    pub fn new(layouts: Vec<Layout>) -> Result<Self, TooFewLayouts> {
        let mut unique: Vec<Layout> = Vec::with_capacity(layouts.len());
        for layout in layouts {
            if !unique.contains(&layout) {
                unique.push(layout);
            }
        }
        if unique.len() < Self::MIN_LEN {
            return Err(TooFewLayouts(unique.len()));
        }
        Ok(Self { layouts: unique })
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn first(&self) -> &Layout {
        &self.layouts[0]
    }

    pub fn get(&self, index: usize) -> Option<&Layout> {
        self.layouts.get(index)
    }

    pub fn position(&self, layout: &Layout) -> Option<usize> {
        self.layouts.iter().position(|l| l == layout)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layout> {
        self.layouts.iter()
    }

    pub fn as_slice(&self) -> &[Layout] {
        &self.layouts
    }

    /// Index following `index`, wrapping at the end of the list.
    pub fn wrap_next(&self, index: usize) -> usize {
        (index + 1) % self.layouts.len()
    }

    /// Layout after `current` in list order.
    ///
    /// Falls back to the first layout when `current` is not in the list.
    pub fn next_after(&self, current: &Layout) -> &Layout {
        match self.position(current) {
            Some(idx) => &self.layouts[self.wrap_next(idx)],
            None => self.first(),
        }
    }

    /// Layout ids joined for display, e.g. `A -> B`.
    pub fn chain(&self) -> String {
        self.layouts
            .iter()
            .map(|l| l.id())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl<'a> IntoIterator for &'a LayoutList {
    type Item = &'a Layout;
    type IntoIter = std::slice::Iter<'a, Layout>;

    fn into_iter(self) -> Self::IntoIter {
        self.layouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> LayoutList {
        LayoutList::new(names.iter().map(|n| Layout::from(*n)).collect()).unwrap()
    }

    #[test]
    fn test_short_name_gets_prefix() {
        let layout = Layout::from_short_name("  Russian ").unwrap();
        assert_eq!(layout.id(), "com.apple.keylayout.Russian");
        assert_eq!(layout.short_name(), "Russian");
    }

    #[test]
    fn test_prefixed_name_is_kept() {
        let layout = Layout::from_short_name("com.apple.keylayout.ABC").unwrap();
        assert_eq!(layout.id(), "com.apple.keylayout.ABC");
    }

    #[test]
    fn test_parse_layout_list_drops_blanks() {
        let layouts = parse_layout_list("ABC, ,Russian,,");
        assert_eq!(
            layouts,
            vec![
                Layout::from("com.apple.keylayout.ABC"),
                Layout::from("com.apple.keylayout.Russian"),
            ]
        );
    }

    #[test]
    fn test_layout_list_requires_two() {
        assert_eq!(
            LayoutList::new(vec![Layout::from("A")]),
            Err(TooFewLayouts(1))
        );
        assert_eq!(LayoutList::new(vec![]), Err(TooFewLayouts(0)));
    }

    #[test]
    fn test_layout_list_dedups() {
        let layouts = LayoutList::new(vec!["A".into(), "B".into(), "A".into()]).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(
            LayoutList::new(vec!["A".into(), "A".into()]),
            Err(TooFewLayouts(1))
        );
    }

    #[test]
    fn test_next_after_wraps_and_falls_back() {
        let layouts = list(&["X", "Y", "Z"]);
        assert_eq!(layouts.next_after(&"X".into()).id(), "Y");
        assert_eq!(layouts.next_after(&"Z".into()).id(), "X");
        assert_eq!(layouts.next_after(&"Q".into()).id(), "X");
    }

    #[test]
    fn test_chain() {
        assert_eq!(list(&["A", "B"]).chain(), "A -> B");
    }
}
