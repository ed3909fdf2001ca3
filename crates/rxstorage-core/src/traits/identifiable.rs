//! Identity for list entries.

use std::hash::Hash;

/// An entity with a stable id, used to de-duplicate paginated results.
pub trait Identifiable {
    type Id: Eq + Hash + Clone + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}
