//! Resolved local changes handed to the deploy path.

use crate::error::{SyncError, SyncResult};
use crate::model::instance::CanonicalInstance;

/// A change over snapshots of one identity, produced by an external diff.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Addition {
        after: CanonicalInstance,
    },
    Modification {
        before: CanonicalInstance,
        after: CanonicalInstance,
    },
}

impl Change {
    pub fn addition(after: CanonicalInstance) -> Self {
        Self::Addition { after }
    }

    /// Builds a modification; both snapshots must share one identity.
    pub fn modification(before: CanonicalInstance, after: CanonicalInstance) -> SyncResult<Self> {
        if before.elem_id != after.elem_id {
            return Err(SyncError::schema(
                &after.type_name,
                format!(
                    "modification snapshots differ in identity: {} vs {}",
                    before.full_name(),
                    after.full_name()
                ),
            ));
        }
        Ok(Self::Modification { before, after })
    }

    /// The post-change snapshot.
    pub fn data(&self) -> &CanonicalInstance {
        match self {
            Self::Addition { after } | Self::Modification { after, .. } => after,
        }
    }

    pub fn before(&self) -> Option<&CanonicalInstance> {
        match self {
            Self::Addition { .. } => None,
            Self::Modification { before, .. } => Some(before),
        }
    }

    pub fn is_modification(&self) -> bool {
        matches!(self, Self::Modification { .. })
    }
}
