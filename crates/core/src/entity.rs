//! Entity trait: identity + continuity across re-fetches.

/// Entity marker + minimal interface.
///
/// Section managers hold flat lists of server records; lookups by identity go
/// through this trait so the same helper serves employees and projects.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Find a cached record by identifier.
pub fn find_by_id<E: Entity>(items: &[E], id: E::Id) -> Option<&E> {
    items.iter().find(|item| item.id() == id)
}
