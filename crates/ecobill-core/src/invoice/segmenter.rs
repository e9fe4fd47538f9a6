//! Splitting document text into ordered lines.

/// Ordered lines of one document, borrowed from its text.
///
/// Lines are kept as-is: no trimming, and empty lines stay in place because
/// extractors look a fixed number of lines past a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lines<'a> {
    text: &'a str,
    lines: Vec<&'a str>,
}

impl<'a> Lines<'a> {
    /// The full document text the lines were cut from.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Line at `index`, if the document is long enough.
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.lines.get(index).copied()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate lines in document order.
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.lines.iter().copied()
    }

    /// Index of the first line containing `marker`.
    pub fn position_of(&self, marker: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(marker))
    }

    /// Up to `count` lines following `index`, shorter near the end.
    pub fn following(&self, index: usize, count: usize) -> &[&'a str] {
        let start = (index + 1).min(self.lines.len());
        let end = start.saturating_add(count).min(self.lines.len());
        &self.lines[start..end]
    }
}

/// Split concatenated page text into lines on `\n`.
///
/// A `\r` ending a line is treated as part of the line break.
pub fn segment_lines(text: &str) -> Lines<'_> {
    let lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    Lines { text, lines }
}
