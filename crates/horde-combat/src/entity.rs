//! Enemy registry: group enumeration, capabilities and slot-based storage.

use ahash::AHashMap;
use horde_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enemy::Enemy;

/// Error types for registry operations.
#[derive(Debug, Error)]
pub enum EntityError {
    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(EntityId),
    /// Id already present
    #[error("Entity already registered: {0}")]
    Duplicate(EntityId),
}

/// Result type for registry operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Capability: deals contact damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageSource {
    /// Damage per contact
    pub damage: i32,
}

/// Capability: holds a settable target reference.
///
/// The target is a weak relation, resolved through the registry each time
/// it is used.
pub trait Targetable {
    /// Current target, if any.
    fn target(&self) -> Option<EntityId>;

    /// Replaces the target.
    fn set_target(&mut self, target: Option<EntityId>);
}

/// Registry of live enemies, consumed by the combat core.
///
/// Enumeration order must be deterministic for a given spawn history.
pub trait EnemyRegistry {
    /// All members of the enemies group, in registry order.
    fn enemy_ids(&self) -> Vec<EntityId>;

    /// Looks up an enemy.
    fn enemy(&self, id: EntityId) -> Option<&Enemy>;

    /// Looks up an enemy mutably.
    fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy>;

    /// Position of `target` if it still exists.
    fn resolve_target(&self, target: EntityId) -> Option<Vec2>;

    /// Removes an enemy from the group.
    fn despawn(&mut self, id: EntityId) -> Option<Enemy>;

    /// Damage capability of `id`, if it has one.
    fn damage_source(&self, id: EntityId) -> Option<DamageSource> {
        self.enemy(id).map(Enemy::damage_source)
    }

    /// Target capability of `id`, if it has one.
    fn targetable_mut(&mut self, id: EntityId) -> Option<&mut dyn Targetable> {
        self.enemy_mut(id).map(|enemy| enemy as &mut dyn Targetable)
    }
}

/// Slot storage for enemies.
///
/// Uses a free list for O(1) insertion and removal; iteration follows slot
/// order, so it only depends on the insert/remove history.
#[derive(Debug, Default, Clone)]
pub struct EnemyStore {
    slots: Vec<Option<Enemy>>,
    free_list: Vec<usize>,
    id_to_index: AHashMap<EntityId, usize>,
}

impl EnemyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    /// Returns true if there are no live enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Total slots, free ones included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Inserts an enemy under its own id.
    pub fn insert(&mut self, enemy: Enemy) -> EntityResult<EntityId> {
        let id = enemy.id();
        if self.id_to_index.contains_key(&id) {
            return Err(EntityError::Duplicate(id));
        }

        let index = if let Some(free_index) = self.free_list.pop() {
            self.slots[free_index] = Some(enemy);
            free_index
        } else {
            self.slots.push(Some(enemy));
            self.slots.len() - 1
        };

        self.id_to_index.insert(id, index);
        Ok(id)
    }

    /// Removes an enemy by id.
    pub fn remove(&mut self, id: EntityId) -> EntityResult<Enemy> {
        let index = self
            .id_to_index
            .remove(&id)
            .ok_or(EntityError::NotFound(id))?;
        let enemy = self.slots[index].take().ok_or(EntityError::NotFound(id))?;
        self.free_list.push(index);
        Ok(enemy)
    }

    /// Gets an enemy by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Enemy> {
        let index = *self.id_to_index.get(&id)?;
        self.slots[index].as_ref()
    }

    /// Gets an enemy mutably by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        let index = *self.id_to_index.get(&id)?;
        self.slots[index].as_mut()
    }

    /// Checks if an enemy with the given id exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Iterates live enemies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Ids of live enemies in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Enemy::id).collect()
    }

    /// Removes every enemy.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.id_to_index.clear();
    }
}
