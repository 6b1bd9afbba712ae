//! Search projection: a filtered, borrowing view of a [`PermissionTree`].
//!
//! The projection never mutates the tree. Matching is a case-insensitive
//! substring test applied top-down:
//!
//! | Node matched by name | Included as |
//! |----------------------|-------------|
//! | Category | the whole category, unfiltered |
//! | Sub-category | the whole sub-category, unfiltered |
//! | Permission only | its sub-category, narrowed to matching permissions |
//!
//! Categories with no match anywhere are dropped. Matched categories and
//! sub-categories report `expanded = true` in the projection (see
//! [`PermTreeConfig::auto_expand_matches`]) while the tree keeps its own
//! flags, so clearing the query restores the prior expansion exactly.
//!
//! Projected permissions carry their position in the underlying tree
//! ([`LeafCoord`]); toggles issued from a filtered view go through the
//! selection engine at those coordinates.
//!
//! ```
//! use permtree::{filter, Category, PermissionTree, SubCategory};
//!
//! let tree = PermissionTree::new().with_category(
//!     "HR Management",
//!     Category::new()
//!         .with_subcategory("Recruitment", SubCategory::new().with_permission("View"))
//!         .with_subcategory("Onboarding", SubCategory::new().with_permission("Edit")),
//! );
//!
//! let view = filter(&tree, "recruit");
//! assert_eq!(view.categories().len(), 1);
//! assert_eq!(view.categories()[0].subcategories().len(), 1);
//! assert!(view.categories()[0].is_expanded());
//! assert!(!tree.category("HR Management").unwrap().is_expanded());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PermTreeConfig;
use crate::model::{Category, CheckState, PermissionTree, SubCategory};

/// Location of a permission in the underlying tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafCoord {
    pub category: String,
    pub subcategory: String,
    pub index: usize,
}

impl LeafCoord {
    #[must_use]
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>, index: usize) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            index,
        }
    }
}

/// Normalized search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    /// Build a query, trimming whitespace when `trim` is set.
    #[must_use]
    pub fn new(raw: impl Into<String>, trim: bool) -> Self {
        let raw = raw.into();
        let needle = if trim {
            raw.trim().to_lowercase()
        } else {
            raw.to_lowercase()
        };
        Self { raw, needle }
    }

    /// Text as the user typed it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the query selects the whole tree.
    ///
    /// Whitespace-only input is always treated as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.trim().is_empty()
    }

    /// Case-insensitive substring test.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.is_empty() || text.to_lowercase().contains(&self.needle)
    }
}

/// Projected permission leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedPermission<'a> {
    category: &'a str,
    subcategory: &'a str,
    index: usize,
    name: &'a str,
    selected: bool,
}

impl<'a> ProjectedPermission<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Index of this permission in the underlying sub-category.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Owned coordinates for routing a toggle back to the tree.
    #[must_use]
    pub fn coord(&self) -> LeafCoord {
        LeafCoord::new(self.category, self.subcategory, self.index)
    }
}

/// Projected sub-category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedSubCategory<'a> {
    name: &'a str,
    expanded: bool,
    name_matched: bool,
    source: &'a SubCategory,
    permissions: Vec<ProjectedPermission<'a>>,
}

impl<'a> ProjectedSubCategory<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Expanded flag for rendering this view.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the sub-category's own name matched the query.
    #[must_use]
    pub fn name_matched(&self) -> bool {
        self.name_matched
    }

    /// Visible permissions, in tree order.
    #[must_use]
    pub fn permissions(&self) -> &[ProjectedPermission<'a>] {
        &self.permissions
    }

    /// Checkbox state of the full underlying sub-category.
    ///
    /// Bulk toggles act on the whole sub-category, so the checkbox reflects
    /// every permission, visible or not.
    #[must_use]
    pub fn check_state(&self) -> CheckState {
        self.source.check_state()
    }
}

/// Projected category. Counts are those of the underlying category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedCategory<'a> {
    name: &'a str,
    expanded: bool,
    name_matched: bool,
    source: &'a Category,
    subcategories: Vec<ProjectedSubCategory<'a>>,
}

impl<'a> ProjectedCategory<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[must_use]
    pub fn name_matched(&self) -> bool {
        self.name_matched
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.source.total()
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.source.selected()
    }

    #[must_use]
    pub fn check_state(&self) -> CheckState {
        self.source.check_state()
    }

    #[must_use]
    pub fn subcategories(&self) -> &[ProjectedSubCategory<'a>] {
        &self.subcategories
    }
}

/// Result of [`filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedTree<'a> {
    query: SearchQuery,
    categories: Vec<ProjectedCategory<'a>>,
}

impl<'a> ProjectedTree<'a> {
    #[must_use]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    #[must_use]
    pub fn categories(&self) -> &[ProjectedCategory<'a>] {
        &self.categories
    }

    /// Whether the view shows the whole tree.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Number of visible permissions.
    #[must_use]
    pub fn visible_permission_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .map(|s| s.permissions.len())
            .sum()
    }

    /// Visible permissions in display order.
    pub fn permissions(&self) -> impl Iterator<Item = &ProjectedPermission<'a>> {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .flat_map(|s| s.permissions.iter())
    }
}

impl PartialEq<PermissionTree> for ProjectedTree<'_> {
    /// Structural equality: same nodes, order, flags, and counts.
    fn eq(&self, tree: &PermissionTree) -> bool {
        self.categories.len() == tree.len()
            && self
                .categories
                .iter()
                .zip(tree.categories())
                .all(|(projected, (name, category))| {
                    projected.name == name
                        && projected.expanded == category.is_expanded()
                        && projected.total() == category.total()
                        && projected.selected() == category.selected()
                        && projected.subcategories.len() == category.len()
                        && projected.subcategories.iter().zip(category.subcategories()).all(
                            |(p_sub, (sub_name, sub))| {
                                p_sub.name == sub_name
                                    && p_sub.expanded == sub.is_expanded()
                                    && p_sub.permissions.len() == sub.len()
                                    && p_sub.permissions.iter().zip(sub.permissions()).all(
                                        |(p_leaf, leaf)| {
                                            p_leaf.name == leaf.name()
                                                && p_leaf.selected == leaf.is_selected()
                                        },
                                    )
                            },
                        )
                })
    }
}

/// Project `tree` through `query` using the default configuration.
#[must_use]
pub fn filter<'a>(tree: &'a PermissionTree, query: &str) -> ProjectedTree<'a> {
    filter_with(tree, query, &PermTreeConfig::default())
}

/// Project `tree` through `query`.
#[must_use]
pub fn filter_with<'a>(
    tree: &'a PermissionTree,
    query: &str,
    config: &PermTreeConfig,
) -> ProjectedTree<'a> {
    let query = SearchQuery::new(query, config.trim_query);
    let auto_expand = config.auto_expand_matches && !query.is_empty();

    let mut categories = Vec::new();
    for (name, category) in tree.categories() {
        if let Some(projected) = project_category(name, category, &query, auto_expand) {
            categories.push(projected);
        }
    }

    let projected = ProjectedTree { query, categories };
    tracing::trace!(
        query = projected.query.raw(),
        categories = projected.categories.len(),
        permissions = projected.visible_permission_count(),
        "projected permission tree"
    );
    projected
}

fn project_category<'a>(
    name: &'a str,
    category: &'a Category,
    query: &SearchQuery,
    auto_expand: bool,
) -> Option<ProjectedCategory<'a>> {
    let name_matched = !query.is_empty() && query.matches(name);
    let include_all = query.is_empty() || name_matched;

    let mut subcategories = Vec::new();
    for (sub_name, sub) in category.subcategories() {
        let sub_matched = !include_all && query.matches(sub_name);
        let permissions: Vec<_> = sub
            .permissions()
            .iter()
            .enumerate()
            .filter(|(_, leaf)| include_all || sub_matched || query.matches(leaf.name()))
            .map(|(index, leaf)| ProjectedPermission {
                category: name,
                subcategory: sub_name,
                index,
                name: leaf.name(),
                selected: leaf.is_selected(),
            })
            .collect();

        if include_all || sub_matched || !permissions.is_empty() {
            subcategories.push(ProjectedSubCategory {
                name: sub_name,
                expanded: sub.is_expanded() || (auto_expand && !include_all),
                name_matched: sub_matched,
                source: sub,
                permissions,
            });
        }
    }

    if !include_all && subcategories.is_empty() {
        return None;
    }

    Some(ProjectedCategory {
        name,
        expanded: category.is_expanded() || auto_expand,
        name_matched,
        source: category,
        subcategories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// HR Management: Recruitment 3/5, Onboarding 1/1; Finance: Payroll 0/2.
    fn tree() -> PermissionTree {
        PermissionTree::new()
            .with_category(
                "HR Management",
                Category::new()
                    .with_subcategory(
                        "Recruitment",
                        SubCategory::new()
                            .with_selected_permission("View Candidates")
                            .with_selected_permission("Add Candidates")
                            .with_selected_permission("Edit Candidates")
                            .with_permission("Delete Candidates")
                            .with_permission("Schedule Interviews"),
                    )
                    .with_subcategory(
                        "Onboarding",
                        SubCategory::new().with_selected_permission("Manage Onboarding"),
                    ),
            )
            .with_category(
                "Finance",
                Category::new().with_expanded(true).with_subcategory(
                    "Payroll",
                    SubCategory::new()
                        .with_permission("Run Payroll")
                        .with_permission("Approve Payroll"),
                ),
            )
    }

    #[test]
    fn empty_query_is_the_whole_tree() {
        let tree = tree();
        let view = filter(&tree, "");
        assert!(view.is_unfiltered());
        assert_eq!(view, tree);
        assert_eq!(view.visible_permission_count(), tree.total_count());
    }

    #[test]
    fn whitespace_query_is_the_whole_tree() {
        let tree = tree();
        assert_eq!(filter(&tree, "   \t"), tree);
        let untrimmed = PermTreeConfig {
            trim_query: false,
            ..PermTreeConfig::default()
        };
        assert_eq!(filter_with(&tree, "  ", &untrimmed), tree);
    }

    #[test]
    fn empty_query_keeps_underlying_expansion() {
        let tree = tree();
        let view = filter(&tree, "");
        assert!(!view.categories()[0].is_expanded());
        assert!(view.categories()[1].is_expanded());
    }

    #[test]
    fn subcategory_name_match_includes_whole_subcategory() {
        let tree = tree();
        let view = filter(&tree, "recruit");
        assert_eq!(view.categories().len(), 1);
        let hr = &view.categories()[0];
        assert_eq!(hr.name(), "HR Management");
        assert!(hr.is_expanded());
        assert!(!hr.name_matched());
        assert_eq!((hr.selected(), hr.total()), (4, 6));

        assert_eq!(hr.subcategories().len(), 1);
        let recruitment = &hr.subcategories()[0];
        assert_eq!(recruitment.name(), "Recruitment");
        assert!(recruitment.name_matched());
        assert!(recruitment.is_expanded());
        assert_eq!(recruitment.permissions().len(), 5);

        // The tree itself is untouched.
        let underlying = tree.category("HR Management").unwrap();
        assert!(!underlying.is_expanded());
        assert!(!underlying.subcategory("Recruitment").unwrap().is_expanded());
    }

    #[test]
    fn category_name_match_includes_whole_category() {
        let tree = tree();
        let view = filter(&tree, "hr man");
        assert_eq!(view.categories().len(), 1);
        let hr = &view.categories()[0];
        assert!(hr.name_matched());
        assert!(hr.is_expanded());
        assert_eq!(hr.subcategories().len(), 2);
        assert_eq!(view.visible_permission_count(), 6);
        // Sub-categories keep their own flags when the category matched.
        assert!(hr.subcategories().iter().all(|s| !s.is_expanded()));
    }

    #[test]
    fn permission_match_narrows_subcategory() {
        let tree = tree();
        let view = filter(&tree, "CANDIDATES");
        let hr = &view.categories()[0];
        assert_eq!(hr.subcategories().len(), 1);
        let names: Vec<_> = hr.subcategories()[0]
            .permissions()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(
            names,
            [
                "View Candidates",
                "Add Candidates",
                "Edit Candidates",
                "Delete Candidates"
            ]
        );
        assert!(hr.subcategories()[0].is_expanded());
    }

    #[test]
    fn projected_leaves_carry_underlying_indices() {
        let tree = tree();
        let view = filter(&tree, "approve");
        let leaves: Vec<_> = view.permissions().collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].coord(), LeafCoord::new("Finance", "Payroll", 1));
        assert_eq!(leaves[0].index(), 1);
    }

    #[test]
    fn no_match_yields_empty_projection() {
        let tree = tree();
        let view = filter(&tree, "warehouse");
        assert!(view.is_empty());
        assert!(!view.is_unfiltered());
    }

    #[test]
    fn auto_expand_can_be_disabled() {
        let tree = tree();
        let config = PermTreeConfig {
            auto_expand_matches: false,
            ..PermTreeConfig::default()
        };
        let view = filter_with(&tree, "recruit", &config);
        assert!(!view.categories()[0].is_expanded());
        assert!(!view.categories()[0].subcategories()[0].is_expanded());
    }

    #[test]
    fn projection_reports_underlying_checkbox_state() {
        let tree = tree();
        let view = filter(&tree, "view candidates");
        let recruitment = &view.categories()[0].subcategories()[0];
        assert_eq!(recruitment.permissions().len(), 1);
        assert_eq!(recruitment.check_state(), CheckState::Indeterminate);
    }

    #[test]
    fn query_normalization() {
        let q = SearchQuery::new("  Pay ", true);
        assert_eq!(q.raw(), "  Pay ");
        assert!(q.matches("Run Payroll"));
        assert!(!q.matches("Onboarding"));

        let untrimmed = SearchQuery::new(" pay", false);
        assert!(!untrimmed.matches("Payroll"));
        assert!(untrimmed.matches("Run Payroll"));
    }
}
