#![forbid(unsafe_code)]

//! Permission selection engine: a three-level category tree with tri-state
//! bulk toggles, derived selection counts, expansion state, and
//! non-destructive search projections.
//!
//! ```
//! use permtree::{filter, Category, CheckState, PermissionTree, SubCategory};
//!
//! let mut tree = PermissionTree::new().with_category(
//!     "HR Management",
//!     Category::new().with_subcategory(
//!         "Recruitment",
//!         SubCategory::new()
//!             .with_selected_permission("View Candidates")
//!             .with_permission("Delete Candidates"),
//!     ),
//! );
//!
//! assert_eq!(tree.global_check_state(), CheckState::Indeterminate);
//!
//! let coord = filter(&tree, "delete").permissions().next().unwrap().coord();
//! tree.toggle_at(&coord).unwrap();
//! assert_eq!(tree.global_check_state(), CheckState::Checked);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod expansion;
pub mod model;
pub mod search;
pub mod selection;
pub mod session;

pub use catalog::{CatalogCategory, CatalogPermission, PermissionCatalog, PermissionPath, Rehydrated};
pub use config::{ConfigError, ConfigParse, PermTreeConfig};
pub use error::{PermTreeError, PermTreeResult};
pub use expansion::ExpansionSnapshot;
pub use model::{Category, CheckState, Permission, PermissionTree, SubCategory};
pub use search::{
    LeafCoord, ProjectedCategory, ProjectedPermission, ProjectedSubCategory, ProjectedTree,
    SearchQuery, filter, filter_with,
};
pub use session::PermissionSession;
