use std::collections::BTreeSet;

use crate::review::ReviewId;

/// Review ids picked for a bulk action.
///
/// Only ids of the currently loaded page are kept: every load calls
/// [`SelectionSet::retain_loaded`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<ReviewId>,
}

impl SelectionSet {
    pub fn toggle(&mut self, id: &ReviewId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn contains(&self, id: &ReviewId) -> bool {
        self.ids.contains(id)
    }

    /// Selects every id on the page, or clears the page when all of it is
    /// already selected.
    pub fn toggle_all<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a ReviewId>) {
        let page_ids: Vec<&ReviewId> = page_ids.into_iter().collect();
        let all_selected = !page_ids.is_empty() && page_ids.iter().all(|id| self.ids.contains(*id));
        if all_selected {
            for id in page_ids {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(page_ids.into_iter().cloned());
        }
    }

    pub fn retain_loaded<'a>(&mut self, loaded: impl IntoIterator<Item = &'a ReviewId>) -> usize {
        let loaded: BTreeSet<&ReviewId> = loaded.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| loaded.contains(id));
        before - self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ReviewId> {
        self.ids.iter().cloned().collect()
    }
}
