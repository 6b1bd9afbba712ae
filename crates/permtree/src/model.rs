//! Tree model: categories, sub-categories, and permission leaves.
//!
//! The tree is three levels deep. Node names are keys of insertion-ordered
//! maps, so iteration order is display order and lookups are O(1).
//!
//! # Invariants
//!
//! 1. `Category::total()` is the number of leaves under the category. It is
//!    computed while the category is built and never changes afterwards.
//! 2. `Category::selected()` is the number of selected leaves under the
//!    category. It is recomputed by resumming the leaves whenever one of them
//!    changes; nothing assigns it directly.
//! 3. `0 <= selected <= total`.
//! 4. No node is added, removed, or reordered once the tree is built.
//! 5. `expanded` flags are independent of selection.
//!
//! Only the selection and expansion modules obtain `&mut` access to nodes;
//! the public API is read-only apart from the builders, which consume `self`.
//!
//! # Example
//!
//! ```
//! use permtree::{Category, CheckState, PermissionTree, SubCategory};
//!
//! let tree = PermissionTree::new().with_category(
//!     "HR Management",
//!     Category::new()
//!         .with_subcategory(
//!             "Recruitment",
//!             SubCategory::new()
//!                 .with_permission("View Candidates")
//!                 .with_selected_permission("Schedule Interviews"),
//!         )
//!         .with_subcategory("Onboarding", SubCategory::new().with_permission("Assign Buddy")),
//! );
//!
//! let hr = tree.category("HR Management").unwrap();
//! assert_eq!((hr.selected(), hr.total()), (1, 3));
//! assert_eq!(hr.check_state(), CheckState::Indeterminate);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PermTreeError, PermTreeResult};

/// Tri-state display value for a checkbox driven by a `selected/total` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Every leaf is selected.
    Checked,
    /// Some but not all leaves are selected.
    Indeterminate,
    /// No leaf is selected, or there are no leaves at all.
    Unchecked,
}

impl CheckState {
    /// Derive the display state from aggregate counts.
    ///
    /// An empty branch (`total == 0`) reports [`CheckState::Unchecked`].
    #[must_use]
    pub const fn from_counts(selected: usize, total: usize) -> Self {
        if total == 0 || selected == 0 {
            Self::Unchecked
        } else if selected >= total {
            Self::Checked
        } else {
            Self::Indeterminate
        }
    }

    /// Whether the checkbox should render as checked.
    #[must_use]
    pub const fn is_checked(self) -> bool {
        matches!(self, Self::Checked)
    }

    /// Whether the checkbox should render as indeterminate.
    #[must_use]
    pub const fn is_indeterminate(self) -> bool {
        matches!(self, Self::Indeterminate)
    }
}

/// A single selectable capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) selected: bool,
}

impl Permission {
    /// Create an unselected permission.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: false,
        }
    }

    /// Set the initial selection state.
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Permission name as shown to the user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the permission is currently selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

/// Second-level grouping: an ordered list of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    #[serde(default)]
    pub(crate) expanded: bool,
    #[serde(default)]
    pub(crate) permissions: Vec<Permission>,
}

impl SubCategory {
    /// Create an empty, collapsed sub-category.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unselected permission.
    #[must_use]
    pub fn with_permission(self, name: impl Into<String>) -> Self {
        self.with_leaf(Permission::new(name))
    }

    /// Append a pre-selected permission.
    #[must_use]
    pub fn with_selected_permission(self, name: impl Into<String>) -> Self {
        self.with_leaf(Permission::new(name).with_selected(true))
    }

    /// Append a permission value.
    #[must_use]
    pub fn with_leaf(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Set the initial expanded flag.
    #[must_use]
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Permissions in display order.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Permission at `index`, if any.
    #[must_use]
    pub fn permission(&self, index: usize) -> Option<&Permission> {
        self.permissions.get(index)
    }

    /// Number of permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether the sub-category has no permissions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Number of selected permissions.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.permissions.iter().filter(|p| p.selected).count()
    }

    /// Whether every permission is selected (vacuously true when empty).
    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.permissions.iter().all(|p| p.selected)
    }

    /// Tri-state display value.
    #[must_use]
    pub fn check_state(&self) -> CheckState {
        CheckState::from_counts(self.selected_count(), self.len())
    }

    /// Whether the sub-category is expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// Top-level grouping with running aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Category {
    total: usize,
    selected: usize,
    pub(crate) expanded: bool,
    pub(crate) subcategories: IndexMap<String, SubCategory>,
}

impl Category {
    /// Create an empty, collapsed category.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sub-category.
    ///
    /// Re-using a name replaces the earlier sub-category in place.
    #[must_use]
    pub fn with_subcategory(mut self, name: impl Into<String>, subcategory: SubCategory) -> Self {
        self.subcategories.insert(name.into(), subcategory);
        self.total = self.subcategories.values().map(SubCategory::len).sum();
        self.recount();
        self
    }

    /// Set the initial expanded flag.
    #[must_use]
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Number of leaves under this category.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of selected leaves under this category.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Whether the category is expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Sub-categories in display order.
    pub fn subcategories(&self) -> impl ExactSizeIterator<Item = (&str, &SubCategory)> {
        self.subcategories
            .iter()
            .map(|(name, sub)| (name.as_str(), sub))
    }

    /// Sub-category by name, if any.
    #[must_use]
    pub fn subcategory(&self, name: &str) -> Option<&SubCategory> {
        self.subcategories.get(name)
    }

    /// Number of sub-categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subcategories.len()
    }

    /// Whether the category has no sub-categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subcategories.is_empty()
    }

    /// `selected == total` for a non-empty category.
    #[must_use]
    pub fn is_fully_selected(&self) -> bool {
        self.total > 0 && self.selected == self.total
    }

    /// `0 < selected < total`.
    #[must_use]
    pub fn is_partially_selected(&self) -> bool {
        self.selected > 0 && self.selected < self.total
    }

    /// Tri-state display value.
    #[must_use]
    pub fn check_state(&self) -> CheckState {
        CheckState::from_counts(self.selected, self.total)
    }

    /// Recompute `selected` from the leaves.
    pub(crate) fn recount(&mut self) {
        self.selected = self.leaves().filter(|p| p.selected).count();
    }

    pub(crate) fn leaves(&self) -> impl Iterator<Item = &Permission> {
        self.subcategories
            .values()
            .flat_map(|sub| sub.permissions.iter())
    }

    pub(crate) fn leaves_mut(&mut self) -> impl Iterator<Item = &mut Permission> {
        self.subcategories
            .values_mut()
            .flat_map(|sub| sub.permissions.iter_mut())
    }

    fn verify(&self, name: &str) -> PermTreeResult<()> {
        let leaves = self.leaves().count();
        let selected = self.leaves().filter(|p| p.selected).count();
        let violation = |detail: String| PermTreeError::InvariantViolation {
            category: name.to_string(),
            detail,
        };
        if self.total != leaves {
            return Err(violation(format!(
                "total={} but the category holds {leaves} permissions",
                self.total
            )));
        }
        if self.selected != selected {
            return Err(violation(format!(
                "selected={} but {selected} permissions are selected",
                self.selected
            )));
        }
        if self.selected > self.total {
            return Err(violation(format!(
                "selected={} exceeds total={}",
                self.selected, self.total
            )));
        }
        Ok(())
    }
}

/// The permission catalog as a selectable tree.
///
/// Serializes to the nested shape
/// `name -> {total, selected, expanded, subcategories -> {expanded, permissions}}`.
/// Deserialization re-derives the aggregates and rejects documents whose
/// stated counts disagree with their leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionTree {
    pub(crate) categories: IndexMap<String, Category>,
}

impl PermissionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category.
    ///
    /// Re-using a name replaces the earlier category in place.
    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>, category: Category) -> Self {
        self.categories.insert(name.into(), category);
        self
    }

    /// Categories in display order.
    pub fn categories(&self) -> impl ExactSizeIterator<Item = (&str, &Category)> {
        self.categories
            .iter()
            .map(|(name, category)| (name.as_str(), category))
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the tree has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Look up a category.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`] for an unknown name.
    pub fn category(&self, category: &str) -> PermTreeResult<&Category> {
        self.categories
            .get(category)
            .ok_or_else(|| PermTreeError::category_not_found(category))
    }

    /// Look up a sub-category.
    ///
    /// # Errors
    /// - [`PermTreeError::CategoryNotFound`] / [`PermTreeError::SubcategoryNotFound`].
    pub fn subcategory(&self, category: &str, subcategory: &str) -> PermTreeResult<&SubCategory> {
        self.category(category)?
            .subcategories
            .get(subcategory)
            .ok_or_else(|| PermTreeError::subcategory_not_found(category, subcategory))
    }

    /// Look up a permission by position.
    ///
    /// # Errors
    /// - Any `NotFound` variant, including an out-of-range index.
    pub fn permission(
        &self,
        category: &str,
        subcategory: &str,
        index: usize,
    ) -> PermTreeResult<&Permission> {
        let sub = self.subcategory(category, subcategory)?;
        sub.permissions
            .get(index)
            .ok_or_else(|| PermTreeError::PermissionNotFound {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                index,
                len: sub.len(),
            })
    }

    /// Number of leaves in the whole tree.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.categories.values().map(Category::total).sum()
    }

    /// Number of selected leaves in the whole tree.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.categories.values().map(Category::selected).sum()
    }

    /// Tri-state value for a "select all permissions" control.
    #[must_use]
    pub fn global_check_state(&self) -> CheckState {
        CheckState::from_counts(self.selected_count(), self.total_count())
    }

    /// Re-derive every aggregate and compare it with the stored value.
    ///
    /// # Errors
    /// - [`PermTreeError::InvariantViolation`] naming the first inconsistent category.
    pub fn check_invariants(&self) -> PermTreeResult<()> {
        for (name, category) in &self.categories {
            category.verify(name)?;
        }
        Ok(())
    }

    pub(crate) fn category_mut(&mut self, category: &str) -> PermTreeResult<&mut Category> {
        self.categories
            .get_mut(category)
            .ok_or_else(|| PermTreeError::category_not_found(category))
    }

    pub(crate) fn subcategory_mut(
        &mut self,
        category: &str,
        subcategory: &str,
    ) -> PermTreeResult<&mut SubCategory> {
        self.category_mut(category)?
            .subcategories
            .get_mut(subcategory)
            .ok_or_else(|| PermTreeError::subcategory_not_found(category, subcategory))
    }

    /// Debug builds assert the invariants after every mutation.
    pub(crate) fn debug_assert_invariants(&self) {
        if cfg!(debug_assertions) {
            if let Err(err) = self.check_invariants() {
                panic!("permission tree invariant violated: {err}");
            }
        }
    }
}

/// Wire shape of a category; the counts are optional and cross-checked.
#[derive(Deserialize)]
struct CategoryDocument {
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    selected: Option<usize>,
    #[serde(default)]
    expanded: bool,
    #[serde(default)]
    subcategories: IndexMap<String, SubCategory>,
}

impl CategoryDocument {
    fn into_category(self, name: &str) -> PermTreeResult<Category> {
        let mut category = Category::new().with_expanded(self.expanded);
        for (sub_name, sub) in self.subcategories {
            category = category.with_subcategory(sub_name, sub);
        }
        let mismatch = |field: &str, stated: usize, actual: usize| {
            PermTreeError::InvariantViolation {
                category: name.to_string(),
                detail: format!("document states {field}={stated} but leaves give {actual}"),
            }
        };
        if let Some(total) = self.total.filter(|&t| t != category.total) {
            return Err(mismatch("total", total, category.total));
        }
        if let Some(selected) = self.selected.filter(|&s| s != category.selected) {
            return Err(mismatch("selected", selected, category.selected));
        }
        Ok(category)
    }
}

impl<'de> Deserialize<'de> for PermissionTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let documents = IndexMap::<String, CategoryDocument>::deserialize(deserializer)?;
        let mut categories = IndexMap::with_capacity(documents.len());
        for (name, document) in documents {
            let category = document
                .into_category(&name)
                .map_err(serde::de::Error::custom)?;
            categories.insert(name, category);
        }
        Ok(Self { categories })
    }
}
