//! Selection engine.
//!
//! Every operation here resolves its coordinates before touching a leaf, so a
//! call either fails with a `NotFound` error and leaves the tree untouched or
//! runs to completion. After any leaf changes, the owning category's
//! `selected` count is recomputed by resumming its leaves.
//!
//! Bulk toggles at category and sub-category level are tri-state: a fully
//! selected branch is cleared, anything else (empty selection or partial) is
//! filled. The tree-wide control takes an explicit boolean instead because the
//! caller owns that checkbox's display state.
//!
//! ```
//! use permtree::{Category, PermissionTree, SubCategory};
//!
//! let mut tree = PermissionTree::new().with_category(
//!     "Finance",
//!     Category::new().with_subcategory(
//!         "Payroll",
//!         SubCategory::new().with_selected_permission("Run").with_permission("Approve"),
//!     ),
//! );
//!
//! // Partial -> full.
//! tree.toggle_category("Finance").unwrap();
//! assert!(tree.is_fully_selected("Finance").unwrap());
//!
//! // Full -> empty.
//! tree.toggle_category("Finance").unwrap();
//! assert_eq!(tree.category("Finance").unwrap().selected(), 0);
//! ```

use crate::catalog::PermissionPath;
use crate::error::{PermTreeError, PermTreeResult};
use crate::model::PermissionTree;
use crate::search::LeafCoord;

impl PermissionTree {
    /// Flip a single permission.
    ///
    /// Returns the permission's new selection state.
    ///
    /// # Errors
    /// - Any `NotFound` variant; the tree is left untouched.
    pub fn toggle_leaf(
        &mut self,
        category: &str,
        subcategory: &str,
        index: usize,
    ) -> PermTreeResult<bool> {
        let sub = self.subcategory_mut(category, subcategory)?;
        let len = sub.permissions.len();
        let leaf = sub
            .permissions
            .get_mut(index)
            .ok_or_else(|| PermTreeError::PermissionNotFound {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                index,
                len,
            })?;
        leaf.selected = !leaf.selected;
        let now = leaf.selected;

        let owner = self.category_mut(category)?;
        owner.recount();
        tracing::debug!(
            category,
            subcategory,
            index,
            selected = now,
            category_selected = owner.selected(),
            category_total = owner.total(),
            "toggled permission"
        );
        self.debug_assert_invariants();
        Ok(now)
    }

    /// [`PermissionTree::toggle_leaf`] at coordinates taken from a projection.
    ///
    /// # Errors
    /// - Any `NotFound` variant.
    pub fn toggle_at(&mut self, coord: &LeafCoord) -> PermTreeResult<bool> {
        self.toggle_leaf(&coord.category, &coord.subcategory, coord.index)
    }

    /// Tri-state toggle of every permission in one sub-category.
    ///
    /// Clears the sub-category when all of its permissions are selected and
    /// selects all of them otherwise. Returns the value written to each leaf.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`] / [`PermTreeError::SubcategoryNotFound`].
    pub fn toggle_subcategory(&mut self, category: &str, subcategory: &str) -> PermTreeResult<bool> {
        let sub = self.subcategory_mut(category, subcategory)?;
        let target = !sub.all_selected();
        for leaf in &mut sub.permissions {
            leaf.selected = target;
        }

        let owner = self.category_mut(category)?;
        owner.recount();
        tracing::debug!(
            category,
            subcategory,
            selected = target,
            category_selected = owner.selected(),
            category_total = owner.total(),
            "toggled sub-category"
        );
        self.debug_assert_invariants();
        Ok(target)
    }

    /// Tri-state toggle of every permission in a category.
    ///
    /// Clears the category when `selected == total` and selects everything
    /// otherwise. Returns the value written to each leaf.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`].
    pub fn toggle_category(&mut self, category: &str) -> PermTreeResult<bool> {
        let owner = self.category_mut(category)?;
        let target = owner.selected() != owner.total();
        for leaf in owner.leaves_mut() {
            leaf.selected = target;
        }
        owner.recount();
        tracing::debug!(
            category,
            selected = target,
            category_selected = owner.selected(),
            category_total = owner.total(),
            "toggled category"
        );
        self.debug_assert_invariants();
        Ok(target)
    }

    /// Set every permission in the tree to `checked`.
    pub fn select_all(&mut self, checked: bool) {
        for category in self.categories.values_mut() {
            for leaf in category.leaves_mut() {
                leaf.selected = checked;
            }
            category.recount();
        }
        tracing::debug!(
            checked,
            selected = self.selected_count(),
            total = self.total_count(),
            "set selection for whole tree"
        );
        self.debug_assert_invariants();
    }

    /// Replace the selection with exactly the permissions named by `saved`.
    ///
    /// Returns the paths that name no permission at all. Each path selects
    /// the first still-unselected permission of that name in its
    /// sub-category, so a name saved twice selects two duplicates.
    pub(crate) fn seed_selection<I>(&mut self, saved: I) -> Vec<PermissionPath>
    where
        I: IntoIterator<Item = PermissionPath>,
    {
        for category in self.categories.values_mut() {
            for leaf in category.leaves_mut() {
                leaf.selected = false;
            }
        }

        let mut unknown = Vec::new();
        for path in saved {
            let Some(sub) = self
                .categories
                .get_mut(&path.category)
                .and_then(|c| c.subcategories.get_mut(&path.subcategory))
            else {
                unknown.push(path);
                continue;
            };
            if !sub.permissions.iter().any(|leaf| leaf.name == path.permission) {
                unknown.push(path);
                continue;
            }
            if let Some(leaf) = sub
                .permissions
                .iter_mut()
                .find(|leaf| leaf.name == path.permission && !leaf.selected)
            {
                leaf.selected = true;
            }
        }

        for category in self.categories.values_mut() {
            category.recount();
        }
        self.debug_assert_invariants();
        unknown
    }

    /// Whether every permission of a non-empty category is selected.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`].
    pub fn is_fully_selected(&self, category: &str) -> PermTreeResult<bool> {
        Ok(self.category(category)?.is_fully_selected())
    }

    /// Whether `0 < selected < total` for a category.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`].
    pub fn is_partially_selected(&self, category: &str) -> PermTreeResult<bool> {
        Ok(self.category(category)?.is_partially_selected())
    }
}
