//! Expansion state: UI-only open/closed flags.
//!
//! Expansion is orthogonal to selection. Nothing in this module reads or
//! writes a `selected` field.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::PermTreeResult;
use crate::model::PermissionTree;

impl PermissionTree {
    /// Flip a category's expanded flag; returns the new value.
    ///
    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`].
    pub fn toggle_category_expanded(&mut self, category: &str) -> PermTreeResult<bool> {
        let node = self.category_mut(category)?;
        node.expanded = !node.expanded;
        tracing::debug!(category, expanded = node.expanded, "toggled category expansion");
        Ok(node.expanded)
    }

    /// Flip a sub-category's expanded flag; returns the new value.
    ///
    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`] / [`crate::PermTreeError::SubcategoryNotFound`].
    pub fn toggle_subcategory_expanded(
        &mut self,
        category: &str,
        subcategory: &str,
    ) -> PermTreeResult<bool> {
        let node = self.subcategory_mut(category, subcategory)?;
        node.expanded = !node.expanded;
        tracing::debug!(
            category,
            subcategory,
            expanded = node.expanded,
            "toggled sub-category expansion"
        );
        Ok(node.expanded)
    }

    /// Set a category's expanded flag explicitly.
    ///
    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`].
    pub fn set_category_expanded(&mut self, category: &str, expanded: bool) -> PermTreeResult<()> {
        self.category_mut(category)?.expanded = expanded;
        Ok(())
    }

    /// Set a sub-category's expanded flag explicitly.
    ///
    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`] / [`crate::PermTreeError::SubcategoryNotFound`].
    pub fn set_subcategory_expanded(
        &mut self,
        category: &str,
        subcategory: &str,
        expanded: bool,
    ) -> PermTreeResult<()> {
        self.subcategory_mut(category, subcategory)?.expanded = expanded;
        Ok(())
    }

    /// Whether every category and sub-category is expanded.
    #[must_use]
    pub fn is_all_expanded(&self) -> bool {
        self.categories.values().all(|category| {
            category.expanded && category.subcategories.values().all(|sub| sub.expanded)
        })
    }

    /// Expand everything unless everything is already expanded, in which case
    /// collapse everything. Returns the value written to every flag.
    pub fn expand_all(&mut self) -> bool {
        let target = !self.is_all_expanded();
        for category in self.categories.values_mut() {
            category.expanded = target;
            for sub in category.subcategories.values_mut() {
                sub.expanded = target;
            }
        }
        tracing::debug!(expanded = target, "set expansion for whole tree");
        target
    }

    /// Record which nodes are currently expanded.
    #[must_use]
    pub fn expansion_snapshot(&self) -> ExpansionSnapshot {
        let mut snapshot = ExpansionSnapshot::default();
        for (name, category) in &self.categories {
            if category.expanded {
                snapshot.categories.insert(name.clone());
            }
            for (sub_name, sub) in &category.subcategories {
                if sub.expanded {
                    snapshot
                        .subcategories
                        .insert((name.clone(), sub_name.clone()));
                }
            }
        }
        snapshot
    }

    /// Apply a snapshot: nodes it lists are expanded, all others collapsed.
    ///
    /// Entries naming nodes that are not in the tree are ignored.
    pub fn restore_expansion(&mut self, snapshot: &ExpansionSnapshot) {
        for (name, category) in &mut self.categories {
            category.expanded = snapshot.categories.contains(name);
            for (sub_name, sub) in &mut category.subcategories {
                sub.expanded = snapshot
                    .subcategories
                    .contains(&(name.clone(), sub_name.clone()));
            }
        }
    }
}

/// Persistable set of expanded nodes, in tree order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSnapshot {
    /// Expanded category names.
    pub categories: IndexSet<String>,
    /// Expanded `(category, sub-category)` pairs.
    pub subcategories: IndexSet<(String, String)>,
}
