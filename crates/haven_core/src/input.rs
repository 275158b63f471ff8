//! Keyboard state for the frame loop.
//!
//! `is_held` answers "is the key down right now"; `is_just_pressed` and
//! `is_just_released` answer "did it change since the last `end_frame()`".
//! The window layer (or a scripted source) feeds `key_down`/`key_up`, the
//! tick reads the state once, and the loop calls `end_frame()` afterwards.

/// The keys the engine reacts to: WASD and arrows for movement, Escape to
/// leave the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Escape,
}

impl Key {
    pub const ALL: [Key; 9] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Escape,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of keys packed into one word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u16);

impl KeySet {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    /// Returns true if `key` was not already present.
    pub fn insert(&mut self, key: Key) -> bool {
        let added = !self.contains(key);
        self.0 |= key.bit();
        added
    }

    /// Returns true if `key` was present.
    pub fn remove(&mut self, key: Key) -> bool {
        let present = self.contains(key);
        self.0 &= !key.bit();
        present
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |key| self.contains(*key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: KeySet,
    pressed: KeySet,
    released: KeySet,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(key) {
            self.released.insert(key);
        }
    }

    pub fn held(&self) -> KeySet {
        self.held
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    /// True if any of `keys` is held.
    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|key| self.held.contains(*key))
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.released.contains(key)
    }

    /// Let go of everything, as on focus loss; each held key reports a release.
    pub fn release_all(&mut self) {
        self.released.0 |= self.held.0;
        self.held = KeySet::EMPTY;
    }

    pub fn end_frame(&mut self) {
        self.pressed = KeySet::EMPTY;
        self.released = KeySet::EMPTY;
    }
}
