//! The operator's multi-select.
//!
//! Per-id toggles survive page navigation. "Select all" only ever touches the
//! ids handed to it, which callers take from the currently loaded page.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared between the view, the bulk executor, and delete handling.
pub type SharedSelection = Arc<Mutex<SelectionSet>>;

/// Ordered set of record ids, in the order they were selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSelection {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.members.remove(id) {
            self.order.retain(|x| x != id);
            false
        } else {
            self.insert(id);
            true
        }
    }

    /// Header checkbox. When every id on the page is already selected they
    /// are all deselected; otherwise the missing ones are added. Returns
    /// whether the page is fully selected afterwards.
    pub fn select_all_on_page(&mut self, page_ids: &[String]) -> bool {
        let select = !self.all_selected(page_ids);
        self.set_page(page_ids, select);
        select && !page_ids.is_empty()
    }

    /// Explicitly select or deselect every id on the page.
    pub fn set_page(&mut self, page_ids: &[String], selected: bool) {
        if selected {
            for id in page_ids {
                self.insert(id);
            }
        } else {
            let drop: HashSet<&str> = page_ids.iter().map(String::as_str).collect();
            self.members.retain(|id| !drop.contains(id.as_str()));
            self.order.retain(|id| !drop.contains(id.as_str()));
        }
    }

    /// Whether every id in `page_ids` is selected. An empty page counts as
    /// not selected.
    pub fn all_selected(&self, page_ids: &[String]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.members.contains(id))
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: &str) {
        if self.members.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
    }
}
