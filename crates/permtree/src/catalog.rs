//! Permission catalogs: seeding, normalization, export, and rehydration.
//!
//! A catalog is what the roles/permissions service hands us. Categories come
//! in two shapes: grouped (sub-category → permissions) or flat (a bare list
//! of permissions). Flat categories are normalized into a single sub-category
//! while the tree is built, so everything downstream sees one shape.
//!
//! Permissions may be bare names or `{name, selected}` objects:
//!
//! ```
//! use permtree::{PermTreeConfig, PermissionCatalog, PermissionTree};
//!
//! let catalog: PermissionCatalog = serde_json::from_str(r#"{
//!     "HR Management": {
//!         "Recruitment": ["View Candidates", {"name": "Add Candidates", "selected": true}],
//!         "Onboarding": ["Manage Onboarding"]
//!     },
//!     "Reports": ["Export Reports"]
//! }"#).unwrap();
//!
//! let tree = PermissionTree::from_catalog(&catalog, &PermTreeConfig::default());
//! assert_eq!(tree.category("HR Management").unwrap().selected(), 1);
//! assert!(tree.subcategory("Reports", "Reports").is_ok());
//! ```

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::PermTreeConfig;
use crate::model::{Category, Permission, PermissionTree, SubCategory};

/// One permission as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogPermission {
    /// Bare name; starts unselected.
    Name(String),
    /// Name with an explicit initial selection.
    Seeded {
        name: String,
        #[serde(default)]
        selected: bool,
    },
}

impl CatalogPermission {
    /// A pre-selected permission.
    #[must_use]
    pub fn selected(name: impl Into<String>) -> Self {
        Self::Seeded {
            name: name.into(),
            selected: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Seeded { name, .. } => name,
        }
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Seeded { selected: true, .. })
    }

    fn to_leaf(&self) -> Permission {
        Permission::new(self.name()).with_selected(self.is_selected())
    }
}

impl From<&str> for CatalogPermission {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for CatalogPermission {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// One catalog category in either of its wire shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogCategory {
    /// Permissions with no sub-category level.
    Flat(Vec<CatalogPermission>),
    /// Sub-category name → permissions.
    Grouped(IndexMap<String, Vec<CatalogPermission>>),
}

impl CatalogCategory {
    /// Build a flat category.
    #[must_use]
    pub fn flat<P>(permissions: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<CatalogPermission>,
    {
        Self::Flat(permissions.into_iter().map(Into::into).collect())
    }

    /// Build a grouped category from `(sub-category, permissions)` pairs.
    #[must_use]
    pub fn grouped<S, I, P>(subcategories: impl IntoIterator<Item = (S, I)>) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<CatalogPermission>,
    {
        Self::Grouped(
            subcategories
                .into_iter()
                .map(|(name, permissions)| {
                    (
                        name.into(),
                        permissions.into_iter().map(Into::into).collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Catalog as delivered by the roles/permissions service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    categories: IndexMap<String, CatalogCategory>,
}

impl PermissionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category. Re-using a name replaces the earlier entry in place.
    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>, category: CatalogCategory) -> Self {
        self.categories.insert(name.into(), category);
        self
    }

    pub fn categories(&self) -> impl ExactSizeIterator<Item = (&str, &CatalogCategory)> {
        self.categories.iter().map(|(name, c)| (name.as_str(), c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Stable identifier of a permission, used for export and rehydration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionPath {
    pub category: String,
    pub subcategory: String,
    pub permission: String,
}

impl PermissionPath {
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            permission: permission.into(),
        }
    }
}

impl fmt::Display for PermissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.subcategory, self.permission)
    }
}

/// Outcome of [`PermissionTree::rehydrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rehydrated {
    /// Tree with the saved selection applied.
    pub tree: PermissionTree,
    /// Saved paths that name nothing in the catalog.
    pub unknown: Vec<PermissionPath>,
}

impl PermissionTree {
    /// Build a tree from a catalog.
    ///
    /// Flat categories become a single sub-category named by
    /// [`PermTreeConfig::flat_subcategory_for`]. Every node starts with
    /// `config.initial_expanded`.
    #[must_use]
    pub fn from_catalog(catalog: &PermissionCatalog, config: &PermTreeConfig) -> Self {
        let expanded = config.initial_expanded;
        let mut tree = PermissionTree::new();
        for (name, entry) in catalog.categories() {
            let mut category = Category::new().with_expanded(expanded);
            match entry {
                CatalogCategory::Flat(permissions) => {
                    let sub_name = config.flat_subcategory_for(name);
                    let sub = build_subcategory(name, sub_name, permissions, expanded);
                    category = category.with_subcategory(sub_name, sub);
                }
                CatalogCategory::Grouped(subcategories) => {
                    for (sub_name, permissions) in subcategories {
                        category = category.with_subcategory(
                            sub_name.as_str(),
                            build_subcategory(name, sub_name, permissions, expanded),
                        );
                    }
                }
            }
            tree = tree.with_category(name, category);
        }
        tracing::debug!(
            categories = tree.len(),
            permissions = tree.total_count(),
            selected = tree.selected_count(),
            "built permission tree from catalog"
        );
        tree
    }

    /// Build a tree from a catalog and apply a saved role's selection.
    ///
    /// The saved selection replaces any selection seeded by the catalog.
    /// Paths that name nothing in the catalog are returned in
    /// [`Rehydrated::unknown`] and logged; they do not fail the call.
    #[must_use]
    pub fn rehydrate<I>(
        catalog: &PermissionCatalog,
        saved: I,
        config: &PermTreeConfig,
    ) -> Rehydrated
    where
        I: IntoIterator<Item = PermissionPath>,
    {
        let mut tree = Self::from_catalog(catalog, config);
        let unknown = tree.seed_selection(saved);
        for path in &unknown {
            tracing::warn!(path = %path, "saved permission is not in the catalog");
        }
        Rehydrated { tree, unknown }
    }

    /// Selected permissions in display order.
    #[must_use]
    pub fn selected_paths(&self) -> Vec<PermissionPath> {
        let mut paths = Vec::with_capacity(self.selected_count());
        for (name, category) in self.categories() {
            for (sub_name, sub) in category.subcategories() {
                paths.extend(
                    sub.permissions()
                        .iter()
                        .filter(|p| p.is_selected())
                        .map(|p| PermissionPath::new(name, sub_name, p.name())),
                );
            }
        }
        paths
    }
}

fn build_subcategory(
    category: &str,
    name: &str,
    permissions: &[CatalogPermission],
    expanded: bool,
) -> SubCategory {
    let mut seen = HashSet::with_capacity(permissions.len());
    let mut sub = SubCategory::new().with_expanded(expanded);
    for permission in permissions {
        if !seen.insert(permission.name()) {
            tracing::warn!(
                category,
                subcategory = name,
                permission = permission.name(),
                "duplicate permission name in catalog"
            );
        }
        sub = sub.with_leaf(permission.to_leaf());
    }
    sub
}
