use color_eyre::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::editor::NumericFieldEditor;
use crate::model::{CarData, EditedValue};
use crate::persist::EditSink;

/// Committed edits and row touches for the whole inventory.
///
/// At most one edit is kept per row; a later commit replaces the earlier one.
/// Touch counts start at 0 on a row's first touch and are never reset.
#[derive(Debug, Default)]
pub struct EditTracker {
    edited: BTreeMap<i64, f64>,
    touches: BTreeMap<i64, u64>,
}

impl EditTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed edit. Absent edits and negative row ids are ignored.
    pub fn on_edited(&mut self, edit: Option<&EditedValue>) {
        let Some(edit) = edit else {
            return;
        };
        if edit.row_id < 0 {
            debug!(row_id = edit.row_id, "ignoring edit for unbound row");
            return;
        }
        self.edited.insert(edit.row_id, edit.value);
        debug!(row_id = edit.row_id, value = edit.value, "edit recorded");
    }

    /// Record interest in a row, whether or not it gets edited
    pub fn on_touched(&mut self, row: Option<&CarData>) {
        let Some(row) = row else {
            return;
        };
        let count = self
            .touches
            .entry(row.carid)
            .and_modify(|c| *c += 1)
            .or_insert(0);
        debug!(row_id = row.carid, count = *count, "row touched");
    }

    /// The set of live editors was replaced (e.g. a new page). Recorded edits
    /// and touches are kept; only the editors' indicators are reset.
    pub fn on_editor_set_changed(&self, editors: &mut [NumericFieldEditor]) {
        for editor in editors.iter_mut() {
            editor.reset_border();
        }
    }

    /// Hand every recorded edit to `sink`, in ascending row order.
    /// Returns the number of edits persisted.
    pub fn commit_all(&self, sink: &mut dyn EditSink) -> Result<usize> {
        for (&row_id, &value) in &self.edited {
            sink.persist(EditedValue::new(row_id, value))?;
        }
        sink.finish()?;
        info!(count = self.edited.len(), "edits saved");
        Ok(self.edited.len())
    }

    pub fn edited(&self, row_id: i64) -> Option<f64> {
        self.edited.get(&row_id).copied()
    }

    pub fn touches(&self, row_id: i64) -> Option<u64> {
        self.touches.get(&row_id).copied()
    }

    pub fn edited_count(&self) -> usize {
        self.edited.len()
    }

    pub fn touched_count(&self) -> usize {
        self.touches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{BorderToken, KeyStroke};
    use crate::model::Transmission;
    use crate::persist::MemorySink;

    fn car(id: i64) -> CarData {
        CarData {
            carid: id,
            year: 2020,
            model: "Civic".to_string(),
            price: 15000.0,
            mileage: 1000.0,
            color: "Blue".to_string(),
            transmission: Transmission::Auto,
        }
    }

    #[test]
    fn test_edits_overwrite() {
        let mut tracker = EditTracker::new();
        tracker.on_edited(Some(&EditedValue::new(4, 10.0)));
        tracker.on_edited(Some(&EditedValue::new(4, 20.0)));
        assert_eq!(tracker.edited(4), Some(20.0));
        assert_eq!(tracker.edited_count(), 1);
    }

    #[test]
    fn test_guarded_edits_are_ignored() {
        let mut tracker = EditTracker::new();
        tracker.on_edited(None);
        tracker.on_edited(Some(&EditedValue::new(-1, 5.0)));
        assert_eq!(tracker.edited_count(), 0);
        assert_eq!(tracker.edited(-1), None);
    }

    #[test]
    fn test_touch_counts() {
        let mut tracker = EditTracker::new();
        let a = car(1);
        let b = car(2);
        tracker.on_touched(Some(&a));
        assert_eq!(tracker.touches(1), Some(0));
        tracker.on_touched(Some(&a));
        assert_eq!(tracker.touches(1), Some(1));
        tracker.on_touched(Some(&b));
        tracker.on_touched(Some(&a));
        assert_eq!(tracker.touches(1), Some(2));
        assert_eq!(tracker.touches(2), Some(0));
        tracker.on_touched(None);
        assert_eq!(tracker.touched_count(), 2);
    }

    #[test]
    fn test_touch_does_not_edit() {
        let mut tracker = EditTracker::new();
        tracker.on_touched(Some(&car(1)));
        assert_eq!(tracker.edited(1), None);
    }

    #[test]
    fn test_editor_set_change_resets_borders_only() {
        let mut tracker = EditTracker::new();
        let mut editors = vec![
            NumericFieldEditor::new(1, "10"),
            NumericFieldEditor::new(2, "20"),
        ];
        editors[0].on_focus();
        editors[0].set_text("11");
        editors[0].on_key_up(&KeyStroke::enter());
        assert_eq!(editors[0].border(), BorderToken::Edited);
        tracker.on_edited(Some(&EditedValue::new(1, 11.0)));

        tracker.on_editor_set_changed(&mut editors);
        assert!(editors.iter().all(|e| e.border() == BorderToken::Neutral));
        assert_eq!(tracker.edited(1), Some(11.0));
    }

    #[test]
    fn test_commit_all_in_row_order() {
        let mut tracker = EditTracker::new();
        tracker.on_edited(Some(&EditedValue::new(9, 900.0)));
        tracker.on_edited(Some(&EditedValue::new(2, 200.0)));
        let mut sink = MemorySink::default();
        assert_eq!(tracker.commit_all(&mut sink).unwrap(), 2);
        assert_eq!(
            sink.edits,
            vec![EditedValue::new(2, 200.0), EditedValue::new(9, 900.0)]
        );
        assert!(sink.finished);
        // saving does not clear recorded edits
        assert_eq!(tracker.edited_count(), 2);
    }
}
