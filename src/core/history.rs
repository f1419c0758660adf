use super::report::ValidationReport;

/// A stored report as listed in the history view
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    report: ValidationReport,
}

impl HistoryEntry {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid
    }

    pub fn name(&self) -> &str {
        &self.report.name
    }

    pub fn author(&self) -> &str {
        &self.report.author
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }
}

impl From<ValidationReport> for HistoryEntry {
    fn from(report: ValidationReport) -> Self {
        Self { report }
    }
}

/// List/detail navigation over one fetched batch of history
#[derive(Debug, Default)]
pub struct HistoryView {
    entries: Option<Vec<HistoryEntry>>,
    cursor: usize,
    selected: Option<usize>,
}

impl HistoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch still outstanding
    pub fn is_loading(&self) -> bool {
        self.entries.is_none()
    }

    pub fn load(&mut self, reports: Vec<ValidationReport>) {
        tracing::debug!("History loaded with {} entries", reports.len());
        self.entries = Some(reports.into_iter().map(HistoryEntry::from).collect());
        self.cursor = 0;
        self.selected = None;
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        self.entries.as_deref().unwrap_or(&[])
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    /// Promote an entry to full-report display. Out of range is a no-op.
    pub fn select(&mut self, index: usize) -> Option<&ValidationReport> {
        if index >= self.entries().len() {
            return None;
        }
        self.cursor = index;
        self.selected = Some(index);
        self.selected_report()
    }

    pub fn select_cursor(&mut self) -> Option<&ValidationReport> {
        self.select(self.cursor)
    }

    /// Return to the list; entries are kept, nothing is refetched
    pub fn back(&mut self) {
        self.selected = None;
    }

    pub fn selected_report(&self) -> Option<&ValidationReport> {
        self.selected
            .and_then(|i| self.entries().get(i))
            .map(HistoryEntry::report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(name: &str, valid: bool) -> ValidationReport {
        serde_json::from_value(json!({"is_valid": valid, "name": name, "author": "alice"})).unwrap()
    }

    #[test]
    fn test_loading_until_first_load() {
        let mut view = HistoryView::new();
        assert!(view.is_loading());
        assert!(view.entries().is_empty());

        view.load(vec![]);
        assert!(!view.is_loading());
        assert!(view.entries().is_empty());
        assert_eq!(view.select_cursor(), None);
    }

    #[test]
    fn test_select_and_back_keep_entries() {
        let mut view = HistoryView::new();
        view.load(vec![report("One", true), report("Two", false)]);

        let selected = view.select(1).unwrap();
        assert_eq!(selected.name, "Two");
        assert!(!selected.is_valid);

        view.back();
        assert_eq!(view.selected_report(), None);
        assert_eq!(view.entries().len(), 2);
        assert_eq!(view.cursor(), 1);
    }

    #[test]
    fn test_select_out_of_range() {
        let mut view = HistoryView::new();
        view.load(vec![report("One", true)]);
        assert_eq!(view.select(5), None);
        assert_eq!(view.selected_report(), None);
    }

    #[test]
    fn test_cursor_clamps() {
        let mut view = HistoryView::new();
        view.load(vec![report("a", true), report("b", true), report("c", true)]);

        view.move_cursor(-1);
        assert_eq!(view.cursor(), 0);
        view.move_cursor(10);
        assert_eq!(view.cursor(), 2);
        assert_eq!(view.select_cursor().unwrap().name, "c");
    }

    #[test]
    fn test_entry_summary_fields() {
        let entry = HistoryEntry::from(report("Deck", true));
        assert!(entry.is_valid());
        assert_eq!(entry.name(), "Deck");
        assert_eq!(entry.author(), "alice");
    }
}
