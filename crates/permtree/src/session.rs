//! Editing session for one role's permission selection.
//!
//! A session owns the tree, the active search text, and the configuration
//! the host loaded. Rendering goes through [`PermissionSession::view`]; every
//! edit goes through the session so the search text never leaks into the
//! tree and, when enabled, aggregates are re-verified after each edit.
//!
//! ```
//! use permtree::{CatalogCategory, PermTreeConfig, PermissionCatalog, PermissionSession};
//!
//! let catalog = PermissionCatalog::new().with_category(
//!     "Reports",
//!     CatalogCategory::flat(["Export Reports", "Schedule Reports"]),
//! );
//! let mut session = PermissionSession::from_catalog(&catalog, PermTreeConfig::default());
//!
//! session.set_query("export");
//! let coord = session.view().permissions().next().unwrap().coord();
//! session.toggle_at(&coord).unwrap();
//! session.clear_query();
//!
//! assert_eq!(session.selected_paths().len(), 1);
//! assert_eq!(session.view().visible_permission_count(), 2);
//! ```

use crate::catalog::{PermissionCatalog, PermissionPath};
use crate::config::PermTreeConfig;
use crate::error::PermTreeResult;
use crate::expansion::ExpansionSnapshot;
use crate::model::{CheckState, PermissionTree};
use crate::search::{LeafCoord, ProjectedTree, filter_with};

/// A tree being edited, plus its search text and configuration.
#[derive(Debug, Clone)]
pub struct PermissionSession {
    tree: PermissionTree,
    config: PermTreeConfig,
    query: String,
}

impl PermissionSession {
    #[must_use]
    pub fn new(tree: PermissionTree, config: PermTreeConfig) -> Self {
        Self {
            tree,
            config,
            query: String::new(),
        }
    }

    /// Start a session on a freshly built catalog tree.
    #[must_use]
    pub fn from_catalog(catalog: &PermissionCatalog, config: PermTreeConfig) -> Self {
        let tree = PermissionTree::from_catalog(catalog, &config);
        Self::new(tree, config)
    }

    #[must_use]
    pub fn tree(&self) -> &PermissionTree {
        &self.tree
    }

    #[must_use]
    pub fn config(&self) -> &PermTreeConfig {
        &self.config
    }

    // --- Search ---

    /// Replace the search text. The tree is not touched.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        tracing::trace!(query = %self.query, "search text changed");
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The tree as it should be rendered for the current search text.
    #[must_use]
    pub fn view(&self) -> ProjectedTree<'_> {
        filter_with(&self.tree, &self.query, &self.config)
    }

    // --- Selection ---

    /// See [`PermissionTree::toggle_leaf`].
    ///
    /// # Errors
    /// - Any `NotFound` variant, or an invariant violation when verification is on.
    pub fn toggle_leaf(
        &mut self,
        category: &str,
        subcategory: &str,
        index: usize,
    ) -> PermTreeResult<bool> {
        let now = self.tree.toggle_leaf(category, subcategory, index)?;
        self.verify()?;
        Ok(now)
    }

    /// Toggle a permission picked from [`PermissionSession::view`].
    ///
    /// # Errors
    /// - Any `NotFound` variant, or an invariant violation when verification is on.
    pub fn toggle_at(&mut self, coord: &LeafCoord) -> PermTreeResult<bool> {
        let now = self.tree.toggle_at(coord)?;
        self.verify()?;
        Ok(now)
    }

    /// See [`PermissionTree::toggle_subcategory`].
    ///
    /// # Errors
    /// - Any `NotFound` variant, or an invariant violation when verification is on.
    pub fn toggle_subcategory(&mut self, category: &str, subcategory: &str) -> PermTreeResult<bool> {
        let target = self.tree.toggle_subcategory(category, subcategory)?;
        self.verify()?;
        Ok(target)
    }

    /// See [`PermissionTree::toggle_category`].
    ///
    /// # Errors
    /// - Any `NotFound` variant, or an invariant violation when verification is on.
    pub fn toggle_category(&mut self, category: &str) -> PermTreeResult<bool> {
        let target = self.tree.toggle_category(category)?;
        self.verify()?;
        Ok(target)
    }

    /// See [`PermissionTree::select_all`].
    ///
    /// # Errors
    /// - An invariant violation when verification is on.
    pub fn select_all(&mut self, checked: bool) -> PermTreeResult<()> {
        self.tree.select_all(checked);
        self.verify()
    }

    /// State for the tree-wide checkbox.
    #[must_use]
    pub fn global_check_state(&self) -> CheckState {
        self.tree.global_check_state()
    }

    // --- Expansion ---

    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`].
    pub fn toggle_category_expanded(&mut self, category: &str) -> PermTreeResult<bool> {
        self.tree.toggle_category_expanded(category)
    }

    /// # Errors
    /// - Any `NotFound` variant.
    pub fn toggle_subcategory_expanded(
        &mut self,
        category: &str,
        subcategory: &str,
    ) -> PermTreeResult<bool> {
        self.tree.toggle_subcategory_expanded(category, subcategory)
    }

    /// # Errors
    /// - [`crate::PermTreeError::CategoryNotFound`].
    pub fn set_category_expanded(&mut self, category: &str, expanded: bool) -> PermTreeResult<()> {
        self.tree.set_category_expanded(category, expanded)
    }

    /// # Errors
    /// - Any `NotFound` variant.
    pub fn set_subcategory_expanded(
        &mut self,
        category: &str,
        subcategory: &str,
        expanded: bool,
    ) -> PermTreeResult<()> {
        self.tree
            .set_subcategory_expanded(category, subcategory, expanded)
    }

    pub fn expand_all(&mut self) -> bool {
        self.tree.expand_all()
    }

    #[must_use]
    pub fn expansion_snapshot(&self) -> ExpansionSnapshot {
        self.tree.expansion_snapshot()
    }

    pub fn restore_expansion(&mut self, snapshot: &ExpansionSnapshot) {
        self.tree.restore_expansion(snapshot);
    }

    // --- Export ---

    /// Selected permissions in display order, ready to save.
    #[must_use]
    pub fn selected_paths(&self) -> Vec<PermissionPath> {
        self.tree.selected_paths()
    }

    /// End the session and hand back the tree.
    #[must_use]
    pub fn finish(self) -> PermissionTree {
        tracing::debug!(
            selected = self.tree.selected_count(),
            total = self.tree.total_count(),
            "permission session finished"
        );
        self.tree
    }

    fn verify(&self) -> PermTreeResult<()> {
        if !self.config.verify_invariants {
            return Ok(());
        }
        self.tree.check_invariants().inspect_err(|err| {
            tracing::warn!(error = %err, "permission tree failed verification");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogCategory, CatalogPermission};

    fn session() -> PermissionSession {
        let catalog = PermissionCatalog::new()
            .with_category(
                "HR Management",
                CatalogCategory::grouped([
                    (
                        "Recruitment",
                        vec![
                            CatalogPermission::selected("View Candidates"),
                            "Delete Candidates".into(),
                        ],
                    ),
                    ("Onboarding", vec!["Manage Onboarding".into()]),
                ]),
            )
            .with_category("Reports", CatalogCategory::flat(["Export Reports"]));
        let config = PermTreeConfig {
            verify_invariants: true,
            ..PermTreeConfig::default()
        };
        PermissionSession::from_catalog(&catalog, config)
    }

    #[test]
    fn query_does_not_reach_the_tree() {
        let mut session = session();
        let before = session.tree().clone();
        session.set_query("onboard");
        assert_eq!(session.view().visible_permission_count(), 1);
        assert!(session.view().categories()[0].is_expanded());
        assert_eq!(session.tree(), &before);

        session.clear_query();
        assert_eq!(session.query(), "");
        assert_eq!(session.view(), before);
    }

    #[test]
    fn toggle_from_filtered_view_updates_tree() {
        let mut session = session();
        session.set_query("delete");
        let coord = session.view().permissions().next().unwrap().coord();
        assert_eq!(coord, LeafCoord::new("HR Management", "Recruitment", 1));

        assert!(session.toggle_at(&coord).unwrap());
        let hr = session.tree().category("HR Management").unwrap();
        assert_eq!((hr.selected(), hr.total()), (2, 3));
        // The view reflects the change without re-entering the query.
        assert!(session.view().permissions().next().unwrap().is_selected());
    }

    #[test]
    fn bulk_operations_delegate() {
        let mut session = session();
        assert!(session.toggle_subcategory("HR Management", "Recruitment").unwrap());
        assert!(session.toggle_category("HR Management").unwrap());
        assert_eq!(session.global_check_state(), CheckState::Indeterminate);

        session.select_all(true).unwrap();
        assert_eq!(session.global_check_state(), CheckState::Checked);
        session.select_all(false).unwrap();
        assert!(session.selected_paths().is_empty());
    }

    #[test]
    fn errors_leave_session_untouched() {
        let mut session = session();
        let before = session.tree().clone();
        assert!(session.toggle_leaf("HR Management", "Recruitment", 9).is_err());
        assert!(session.toggle_category("Sales").is_err());
        assert!(session.toggle_subcategory_expanded("Reports", "Nope").is_err());
        assert_eq!(session.tree(), &before);
    }

    #[test]
    fn expansion_round_trip_through_session() {
        let mut session = session();
        assert!(session.toggle_category_expanded("Reports").unwrap());
        session
            .set_subcategory_expanded("HR Management", "Onboarding", true)
            .unwrap();
        session.set_category_expanded("HR Management", false).unwrap();
        let saved = session.expansion_snapshot();
        assert_eq!(saved.categories.len(), 1);
        assert_eq!(saved.subcategories.len(), 1);
        assert!(session.expand_all());
        session.restore_expansion(&saved);
        assert_eq!(session.expansion_snapshot(), saved);
    }

    #[test]
    fn finish_returns_edited_tree() {
        let mut session = session();
        session.toggle_leaf("Reports", "Reports", 0).unwrap();
        let tree = session.finish();
        assert_eq!(tree.selected_count(), 2);
        tree.check_invariants().unwrap();
    }
}
