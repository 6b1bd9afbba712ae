//! Error taxonomy for the permission tree.
//!
//! The engine performs no I/O, so there is no transient or retryable class.
//! The `*NotFound` variants mean a caller handed the engine coordinates that
//! do not exist in the tree; that is always an integration bug and is
//! propagated rather than swallowed. [`PermTreeError::InvariantViolation`]
//! is reported by [`PermissionTree::check_invariants`] and by deserialization
//! of inconsistent documents.
//!
//! [`PermissionTree::check_invariants`]: crate::PermissionTree::check_invariants

use thiserror::Error;

/// Errors produced by the permission tree and its sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermTreeError {
    /// No category with this name exists in the tree.
    #[error("category '{category}' not found")]
    CategoryNotFound {
        /// Requested category name.
        category: String,
    },

    /// The category exists but has no sub-category with this name.
    #[error("sub-category '{subcategory}' not found in category '{category}'")]
    SubcategoryNotFound {
        /// Owning category name.
        category: String,
        /// Requested sub-category name.
        subcategory: String,
    },

    /// The sub-category exists but the permission index is out of range.
    #[error(
        "permission index {index} out of range in '{category}/{subcategory}' ({len} permissions)"
    )]
    PermissionNotFound {
        /// Owning category name.
        category: String,
        /// Owning sub-category name.
        subcategory: String,
        /// Requested index.
        index: usize,
        /// Number of permissions in the sub-category.
        len: usize,
    },

    /// A derived aggregate disagrees with the leaves it summarizes.
    #[error("invariant violated in category '{category}': {detail}")]
    InvariantViolation {
        /// Category whose aggregates are inconsistent.
        category: String,
        /// Human-readable description of the mismatch.
        detail: String,
    },
}

impl PermTreeError {
    /// Whether this error belongs to the `NotFound` class.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CategoryNotFound { .. }
                | Self::SubcategoryNotFound { .. }
                | Self::PermissionNotFound { .. }
        )
    }

    pub(crate) fn category_not_found(category: &str) -> Self {
        Self::CategoryNotFound {
            category: category.to_string(),
        }
    }

    pub(crate) fn subcategory_not_found(category: &str, subcategory: &str) -> Self {
        Self::SubcategoryNotFound {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type PermTreeResult<T> = Result<T, PermTreeError>;
