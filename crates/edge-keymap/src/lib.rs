//! A small key-sequence trie used by the mode dispatcher's fixed-table
//! modes (CommandMode, AdvancedMode, SecondaryMode).
//!
//! Resolution is pure and deterministic: looking a key sequence up never
//! mutates the map and depends only on the sequence itself. Ambiguity (a
//! strict prefix of one or more bindings, with no terminal binding yet
//! confirmed) is surfaced as `Lookup::Prefix` rather than silently picking
//! one branch.

use smallvec::SmallVec;
use tracing::trace;

/// A single key press, identified by its character (control/function keys
/// are out of scope for this engine — see edge-input for the richer event
/// type fed in at the terminal boundary).
pub type Key = char;

/// A short run of keys, inlined up to 4 without heap allocation (covers
/// every built-in binding; longer sequences still work, just with a spill).
pub type KeySequence = SmallVec<[Key; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a, A> {
    /// The sequence matches a binding exactly.
    Match(&'a A),
    /// The sequence is a strict prefix of one or more bindings.
    Prefix,
    /// No binding starts with this sequence.
    NoMatch,
}

#[derive(Debug)]
struct Node<A> {
    action: Option<A>,
    children: Vec<(Key, Node<A>)>,
}

impl<A> Default for Node<A> {
    fn default() -> Self {
        Self {
            action: None,
            children: Vec::new(),
        }
    }
}

impl<A> Node<A> {
    fn child(&self, k: Key) -> Option<&Node<A>> {
        self.children.iter().find(|(key, _)| *key == k).map(|(_, n)| n)
    }

    fn child_mut(&mut self, k: Key) -> &mut Node<A> {
        if let Some(idx) = self.children.iter().position(|(key, _)| *key == k) {
            &mut self.children[idx].1
        } else {
            self.children.push((k, Node::default()));
            &mut self.children.last_mut().unwrap().1
        }
    }
}

/// A table of key-sequence -> action bindings, compiled into a trie.
#[derive(Debug)]
pub struct KeyMap<A> {
    root: Node<A>,
}

impl<A> Default for KeyMap<A> {
    fn default() -> Self {
        Self { root: Node::default() }
    }
}

impl<A> KeyMap<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `sequence` to `action`. Rebinding an existing sequence replaces
    /// its action.
    pub fn bind(&mut self, sequence: &[Key], action: A) {
        let mut node = &mut self.root;
        for &k in sequence {
            node = node.child_mut(k);
        }
        node.action = Some(action);
    }

    pub fn bind_key(&mut self, key: Key, action: A) {
        self.bind(&[key], action);
    }

    /// Resolve `sequence` against the trie.
    pub fn lookup(&self, sequence: &[Key]) -> Lookup<'_, A> {
        let mut node = &self.root;
        for &k in sequence {
            match node.child(k) {
                Some(next) => node = next,
                None => {
                    trace!(?sequence, "keymap: no match");
                    return Lookup::NoMatch;
                }
            }
        }
        match &node.action {
            Some(action) => Lookup::Match(action),
            None if node.children.is_empty() => Lookup::NoMatch,
            None => Lookup::Prefix,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.action.is_none() && self.root.children.is_empty()
    }
}

/// Accumulates a pending key sequence across dispatch calls, returning the
/// completed action (if any) and clearing itself, or staying pending when
/// the sequence is a strict prefix.
#[derive(Debug, Default)]
pub struct PendingSequence {
    keys: KeySequence,
}

/// Outcome of feeding one key into a [`PendingSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed<A> {
    /// The accumulated sequence resolved to an action; the buffer is
    /// cleared.
    Matched(A),
    /// The accumulated sequence is a strict prefix of one or more
    /// bindings; kept pending, waiting on the next key.
    Pending,
    /// The new key extends no binding, including as a fresh sequence of
    /// its own; the buffer is cleared.
    DeadEnd,
}

impl PendingSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key into the pending sequence and resolve against `map`.
    pub fn feed<A: Clone>(&mut self, key: Key, map: &KeyMap<A>) -> Feed<A> {
        self.keys.push(key);
        match map.lookup(&self.keys) {
            Lookup::Match(action) => {
                let action = action.clone();
                self.keys.clear();
                Feed::Matched(action)
            }
            Lookup::Prefix => Feed::Pending,
            Lookup::NoMatch => {
                self.keys.clear();
                Feed::DeadEnd
            }
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_pending(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[Key] {
        &self.keys
    }
}
