use std::collections::{BTreeSet, HashSet};

use crate::model::{Snapshot, SolutionId};

/// Ids the operator marked for deletion, independent of display order.
///
/// Only ids present in the snapshot the model was last reset against can be selected;
/// anything else is ignored.
#[derive(Clone, Debug, Default)]
pub struct SelectionModel {
    known: HashSet<SolutionId>,
    selected: BTreeSet<SolutionId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous selection and accepts ids from `snapshot` only.
    pub fn reset(&mut self, snapshot: &Snapshot) {
        self.known = snapshot.iter().map(|s| s.solution_id).collect();
        self.selected.clear();
    }

    /// Flips the mark on `id` and returns the new state. Unknown ids stay unselected.
    pub fn toggle(&mut self, id: &SolutionId) -> bool {
        let next = !self.is_selected(id);
        self.set(id, next);
        self.is_selected(id)
    }

    pub fn set(&mut self, id: &SolutionId, selected: bool) {
        if !self.known.contains(id) {
            return;
        }
        if selected {
            self.selected.insert(*id);
        } else {
            self.selected.remove(id);
        }
    }

    /// Marks every known id.
    pub fn select_all(&mut self) {
        self.selected = self.known.iter().copied().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &SolutionId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> BTreeSet<SolutionId> {
        self.selected.clone()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, Solution};

    fn snapshot(n: usize) -> Snapshot {
        let solutions = (0..n)
            .map(|i| Solution {
                entity_kind: EntityKind::solution(),
                solution_id: SolutionId::new(),
                friendly_name: format!("Solution {i}"),
                unique_name: format!("sol{i}"),
                version: "1.0".into(),
                description: None,
                installed_on: None,
            })
            .collect();
        Snapshot::new(1, solutions)
    }

    #[test]
    fn toggle_twice_restores_state() {
        let snap = snapshot(2);
        let mut sel = SelectionModel::new();
        sel.reset(&snap);
        let id = snap.solutions[0].solution_id;

        assert!(sel.toggle(&id));
        assert!(!sel.toggle(&id));
        assert!(!sel.is_selected(&id));

        sel.set(&id, true);
        sel.toggle(&id);
        sel.toggle(&id);
        assert!(sel.is_selected(&id));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let snap = snapshot(1);
        let mut sel = SelectionModel::new();
        sel.reset(&snap);

        let stranger = SolutionId::new();
        assert!(!sel.toggle(&stranger));
        sel.set(&stranger, true);
        assert!(sel.is_empty());
    }

    #[test]
    fn reset_clears_and_rebinds() {
        let first = snapshot(2);
        let mut sel = SelectionModel::new();
        sel.reset(&first);
        sel.select_all();
        assert_eq!(sel.len(), 2);

        let second = snapshot(1);
        sel.reset(&second);
        assert!(sel.is_empty());
        sel.set(&first.solutions[0].solution_id, true);
        assert!(sel.is_empty());
    }

    #[test]
    fn clear_empties_selection() {
        let snap = snapshot(3);
        let mut sel = SelectionModel::new();
        sel.reset(&snap);
        sel.select_all();
        sel.clear();
        assert!(sel.selected_ids().is_empty());
    }
}
