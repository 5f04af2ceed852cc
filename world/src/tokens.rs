//! Authoritative token state management utilities.

use std::collections::HashMap;

use glam::Vec2;
use hexfog_core::{Token, TokenIndex};
use hexfog_system_geometry::{token_bounds, token_radius};
use hexfog_system_spatial_index::SpatialHashGrid;

/// Stable handle registered in the token spatial index.
///
/// List positions shift when tokens are removed, so the index stores keys and
/// resolves them through the cached slot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TokenKey(u64);

/// Ordered token list plus the spatial index and draw-order counter.
#[derive(Debug)]
pub(crate) struct TokenRegistry {
    tokens: Vec<Token>,
    keys: Vec<TokenKey>,
    indexed: Vec<Vec2>,
    slots: HashMap<TokenKey, usize>,
    index: SpatialHashGrid<TokenKey>,
    hex_size: f32,
    next_key: u64,
    next_z_index: u32,
}

impl TokenRegistry {
    /// Creates an empty registry whose index cells span two hexes.
    pub(crate) fn new(hex_size: f32) -> Self {
        Self {
            tokens: Vec::new(),
            keys: Vec::new(),
            indexed: Vec::new(),
            slots: HashMap::new(),
            index: SpatialHashGrid::new(hex_size * 2.0),
            hex_size,
            next_key: 0,
            next_z_index: 1,
        }
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn get(&self, token: TokenIndex) -> Option<&Token> {
        self.tokens.get(token.get())
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn next_z_index(&self) -> u32 {
        self.next_z_index
    }

    /// Replaces every token and rebuilds the index.
    pub(crate) fn replace_all(&mut self, tokens: Vec<Token>, hex_size: f32) {
        self.tokens = tokens;
        self.keys = (0..self.tokens.len()).map(|_| self.allocate_key()).collect();
        self.slots.clear();
        self.rebuild(hex_size);
    }

    /// Re-registers every token at its current position under a fresh index
    /// sized for `hex_size`.
    ///
    /// The draw-order counter restarts just above the highest stored value.
    pub(crate) fn rebuild(&mut self, hex_size: f32) {
        self.hex_size = hex_size;
        self.index = SpatialHashGrid::new(hex_size * 2.0);
        self.indexed = self.tokens.iter().map(Token::position).collect();
        for (position, key) in self.indexed.iter().zip(&self.keys) {
            self.index.insert(*key, &token_bounds(*position, hex_size));
        }
        self.resync_slots(0);
        self.next_z_index = self
            .tokens
            .iter()
            .map(|token| token.z_index)
            .max()
            .map_or(1, |highest| highest.saturating_add(1));
    }

    /// Appends a token drawn above every existing one.
    pub(crate) fn push(&mut self, position: Vec2) -> TokenIndex {
        let z_index = self.allocate_z_index();
        let key = self.allocate_key();
        self.index
            .insert(key, &token_bounds(position, self.hex_size));
        let slot = self.tokens.len();
        self.tokens.push(Token::at(position, z_index));
        self.keys.push(key);
        self.indexed.push(position);
        let _ = self.slots.insert(key, slot);
        TokenIndex::new(slot)
    }

    pub(crate) fn get_mut(&mut self, token: TokenIndex) -> Option<&mut Token> {
        self.tokens.get_mut(token.get())
    }

    /// Removes the token and shifts every later slot down by one.
    pub(crate) fn remove(&mut self, token: TokenIndex) -> Option<Token> {
        let slot = token.get();
        if slot >= self.tokens.len() {
            return None;
        }
        let removed = self.tokens.remove(slot);
        let key = self.keys.remove(slot);
        let indexed = self.indexed.remove(slot);
        self.index.remove(key, &token_bounds(indexed, self.hex_size));
        let _ = self.slots.remove(&key);
        self.resync_slots(slot);
        Some(removed)
    }

    /// Drops every token and restarts the draw-order counter.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.tokens.len();
        self.tokens.clear();
        self.keys.clear();
        self.indexed.clear();
        self.slots.clear();
        self.index.clear();
        self.next_z_index = 1;
        count
    }

    /// Moves a token without touching the index. [`Self::commit_move`] settles it.
    ///
    /// Until then the index keeps the token under its last indexed position.
    pub(crate) fn set_position(&mut self, token: TokenIndex, position: Vec2) -> bool {
        match self.tokens.get_mut(token.get()) {
            Some(entry) => {
                entry.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Re-indexes a dragged token at its current position and raises it.
    pub(crate) fn commit_move(&mut self, token: TokenIndex) -> bool {
        let slot = token.get();
        let Some(position) = self.tokens.get(slot).map(Token::position) else {
            return false;
        };
        let key = self.keys[slot];
        self.index.update(
            key,
            &token_bounds(self.indexed[slot], self.hex_size),
            &token_bounds(position, self.hex_size),
        );
        self.indexed[slot] = position;
        let z_index = self.allocate_z_index();
        self.tokens[slot].z_index = z_index;
        true
    }

    /// Topmost token whose disc contains the world point.
    ///
    /// Candidates are ordered by draw order, with later list entries winning
    /// ties because they are drawn last.
    pub(crate) fn find_at(&self, point: Vec2) -> Option<TokenIndex> {
        let radius = token_radius(self.hex_size);
        let mut candidates: Vec<usize> = self
            .index
            .query_point(point)
            .into_iter()
            .filter_map(|key| self.slots.get(&key).copied())
            .collect();
        candidates.sort_by(|a, b| {
            let (first, second) = (&self.tokens[*a], &self.tokens[*b]);
            second.z_index.cmp(&first.z_index).then(b.cmp(a))
        });
        candidates
            .into_iter()
            .find(|slot| self.tokens[*slot].position().distance(point) <= radius)
            .map(TokenIndex::new)
    }

    /// Cached slot of every token, in list order.
    pub(crate) fn cached_slots(&self) -> Vec<Option<usize>> {
        self.keys
            .iter()
            .map(|key| self.slots.get(key).copied())
            .collect()
    }

    fn resync_slots(&mut self, from: usize) {
        for (slot, key) in self.keys.iter().enumerate().skip(from) {
            let _ = self.slots.insert(*key, slot);
        }
    }

    fn allocate_key(&mut self) -> TokenKey {
        let key = TokenKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn allocate_z_index(&mut self) -> u32 {
        let z_index = self.next_z_index;
        self.next_z_index = self.next_z_index.saturating_add(1);
        z_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(positions: &[Vec2]) -> TokenRegistry {
        let mut registry = TokenRegistry::new(40.0);
        for position in positions {
            let _ = registry.push(*position);
        }
        registry
    }

    #[test]
    fn pushed_tokens_receive_increasing_z_indices() {
        let registry = registry_with(&[Vec2::ZERO, Vec2::new(100.0, 0.0)]);
        let z: Vec<u32> = registry.tokens().iter().map(|token| token.z_index).collect();
        assert_eq!(z, vec![1, 2]);
        assert_eq!(registry.next_z_index(), 3);
    }

    #[test]
    fn removal_resynchronizes_later_slots() {
        let mut registry = registry_with(&[
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(200.0, 0.0),
            Vec2::new(300.0, 0.0),
        ]);
        let _ = registry.remove(TokenIndex::new(1));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.cached_slots(), vec![Some(0), Some(1), Some(2)]);
        assert_eq!(
            registry.find_at(Vec2::new(300.0, 0.0)),
            Some(TokenIndex::new(2))
        );
        assert_eq!(registry.find_at(Vec2::new(100.0, 0.0)), None);
    }

    #[test]
    fn overlapping_tokens_resolve_to_highest_z_index() {
        let mut registry = registry_with(&[Vec2::ZERO, Vec2::new(5.0, 0.0)]);
        assert_eq!(registry.find_at(Vec2::new(2.0, 0.0)), Some(TokenIndex::new(1)));

        assert!(registry.commit_move(TokenIndex::new(0)));
        assert_eq!(registry.find_at(Vec2::new(2.0, 0.0)), Some(TokenIndex::new(0)));
    }

    #[test]
    fn hits_outside_the_token_radius_miss() {
        let registry = registry_with(&[Vec2::ZERO]);
        assert_eq!(registry.find_at(Vec2::new(16.0, 0.0)), Some(TokenIndex::new(0)));
        assert_eq!(registry.find_at(Vec2::new(16.5, 0.0)), None);
    }

    #[test]
    fn committed_moves_update_the_index() {
        let mut registry = registry_with(&[Vec2::ZERO]);
        let token = TokenIndex::new(0);
        assert!(registry.set_position(token, Vec2::new(500.0, 500.0)));
        assert!(registry.commit_move(token));
        assert_eq!(registry.find_at(Vec2::ZERO), None);
        assert_eq!(registry.find_at(Vec2::new(500.0, 500.0)), Some(token));
    }

    #[test]
    fn rebuild_restarts_counter_above_highest_z_index() {
        let mut registry = TokenRegistry::new(40.0);
        let mut tokens = vec![Token::at(Vec2::ZERO, 7), Token::at(Vec2::ONE, 3)];
        tokens[1].label = "scout".to_owned();
        registry.replace_all(tokens, 40.0);
        assert_eq!(registry.next_z_index(), 8);
        assert_eq!(registry.cached_slots(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn repeated_replacement_keeps_the_slot_table_bounded() {
        let mut registry = registry_with(&[Vec2::ZERO, Vec2::new(100.0, 0.0)]);
        let snapshot = registry.tokens().to_vec();
        for _ in 0..50 {
            registry.replace_all(snapshot.clone(), 40.0);
        }
        assert_eq!(registry.slots.len(), registry.len());
        assert_eq!(registry.cached_slots(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn removing_a_token_mid_drag_drops_its_indexed_entry() {
        let mut registry = registry_with(&[Vec2::ZERO, Vec2::new(400.0, 400.0)]);
        assert!(registry.set_position(TokenIndex::new(0), Vec2::new(50.0, 50.0)));
        let _ = registry.remove(TokenIndex::new(0));

        assert!(registry.index.query_point(Vec2::ZERO).is_empty());
        assert_eq!(registry.find_at(Vec2::ZERO), None);
        assert_eq!(
            registry.find_at(Vec2::new(400.0, 400.0)),
            Some(TokenIndex::new(0))
        );
        assert_eq!(registry.slots.len(), 1);
    }

    #[test]
    fn clear_resets_counter() {
        let mut registry = registry_with(&[Vec2::ZERO, Vec2::ONE]);
        assert_eq!(registry.clear(), 2);
        assert_eq!(registry.next_z_index(), 1);
        assert_eq!(registry.find_at(Vec2::ZERO), None);
    }
}
