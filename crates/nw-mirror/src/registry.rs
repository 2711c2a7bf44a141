//! Registry of collected pages and collections.
//!
//! Entities are stored in a flat `Vec` in discovery order, with an id index.
//! Discovery order is deterministic for unchanged content and drives every
//! later ordering decision (materialization, slug claims, failure lists).

use std::collections::HashMap;

use nw_notion::EntityId;

/// What an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Page,
    /// A database.
    Collection,
}

/// A collected page or collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub title: String,
    /// Entity whose children list contained this one. `None` for the root
    /// and for collections reached only through relation properties.
    pub tree_parent: Option<EntityId>,
}

/// Every entity reachable from the root, each registered once.
#[derive(Debug, Clone)]
pub struct Registry {
    root: EntityId,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

impl Registry {
    /// Create a registry holding only the root.
    pub(crate) fn new(root: EntityId, kind: EntityKind, title: String) -> Self {
        Self {
            root,
            entities: vec![Entity {
                id: root,
                kind,
                title,
                tree_parent: None,
            }],
            index: HashMap::from([(root, 0)]),
        }
    }

    /// Register an entity, returning `true` if it was not known yet.
    ///
    /// For a known entity the first title and kind stay authoritative; a
    /// missing tree parent is backfilled but an existing one is never
    /// replaced. The root never gets a tree parent.
    pub(crate) fn register(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        title: String,
        tree_parent: Option<EntityId>,
    ) -> bool {
        if let Some(&idx) = self.index.get(&id) {
            let entity = &mut self.entities[idx];
            if entity.tree_parent.is_none()
                && id != self.root
                && let Some(parent) = tree_parent
                && parent != id
            {
                tracing::debug!("backfilling tree parent of {id} with {parent}");
                entity.tree_parent = Some(parent);
            }
            return false;
        }

        self.index.insert(id, self.entities.len());
        self.entities.push(Entity {
            id,
            kind,
            title,
            tree_parent,
        });
        true
    }

    /// The root id.
    #[must_use]
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&idx| &self.entities[idx])
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// All entities in discovery order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Always false: the root is always registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> EntityId {
        EntityId::parse(&format!("{n:032x}")).unwrap()
    }

    #[test]
    fn test_new_registry_holds_root() {
        let registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.root(), id(1));
        assert_eq!(registry.get(&id(1)).unwrap().tree_parent, None);
    }

    #[test]
    fn test_register_twice_keeps_first() {
        let mut registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());

        assert!(registry.register(id(2), EntityKind::Page, "First".to_owned(), Some(id(1))));
        assert!(!registry.register(id(2), EntityKind::Collection, "Second".to_owned(), None));

        let entity = registry.get(&id(2)).unwrap();
        assert_eq!(entity.title, "First");
        assert_eq!(entity.kind, EntityKind::Page);
        assert_eq!(entity.tree_parent, Some(id(1)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_parent_is_backfilled() {
        let mut registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());
        registry.register(id(3), EntityKind::Collection, "Tasks".to_owned(), None);

        registry.register(id(3), EntityKind::Collection, "Tasks".to_owned(), Some(id(2)));

        assert_eq!(registry.get(&id(3)).unwrap().tree_parent, Some(id(2)));
    }

    #[test]
    fn test_existing_parent_is_not_overwritten() {
        let mut registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());
        registry.register(id(3), EntityKind::Page, "Child".to_owned(), Some(id(1)));

        registry.register(id(3), EntityKind::Page, "Child".to_owned(), Some(id(2)));

        assert_eq!(registry.get(&id(3)).unwrap().tree_parent, Some(id(1)));
    }

    #[test]
    fn test_root_never_gets_parent() {
        let mut registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());
        registry.register(id(1), EntityKind::Page, "Home".to_owned(), Some(id(2)));
        assert_eq!(registry.get(&id(1)).unwrap().tree_parent, None);
    }

    #[test]
    fn test_entities_keep_discovery_order() {
        let mut registry = Registry::new(id(1), EntityKind::Page, "Home".to_owned());
        registry.register(id(5), EntityKind::Page, "B".to_owned(), Some(id(1)));
        registry.register(id(4), EntityKind::Page, "A".to_owned(), Some(id(1)));

        let order: Vec<EntityId> = registry.entities().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![id(1), id(5), id(4)]);
    }
}
