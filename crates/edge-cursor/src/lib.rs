//! Per-buffer cursor tracking: [`CursorsSet`], [`CursorsTracker`], and the
//! position-domain [`Transformation`] record used to keep every cursor
//! consistent as the buffer is edited.
//!
//! The "scheduled transformations" batch optimizer from the design is
//! re-expressed as [`reduce`]: a pure function from a raw transformation
//! sequence to a collapsed one, rather than a stateful pointer-comparison
//! walk. That keeps it unit-testable rule by rule.

use std::collections::HashMap;

use edge_text::{Position, Range};

/// A position-domain edit record: describes how every cursor inside `range`
/// moves when a transformation is applied to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    pub range: Range,
    pub line_delta: i64,
    pub line_lower_bound: u64,
    pub column_delta: i64,
    pub column_lower_bound: u64,
}

impl Transformation {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            line_delta: 0,
            line_lower_bound: 0,
            column_delta: 0,
            column_lower_bound: 0,
        }
    }

    pub fn with_line_shift(mut self, delta: i64, lower_bound: u64) -> Self {
        self.line_delta = delta;
        self.line_lower_bound = lower_bound;
        self
    }

    pub fn with_column_shift(mut self, delta: i64, lower_bound: u64) -> Self {
        self.column_delta = delta;
        self.column_lower_bound = lower_bound;
        self
    }

    /// Apply this transformation to a single position. Positions outside
    /// `range` are returned unchanged.
    pub fn apply_to_position(&self, p: Position) -> Position {
        if !self.range.contains(p) {
            return p;
        }
        let line = shift_and_clamp(p.line, self.line_delta, self.line_lower_bound);
        let column = shift_and_clamp(p.column, self.column_delta, self.column_lower_bound);
        Position::new(line, column)
    }

    fn is_noop(&self) -> bool {
        self.line_delta == 0
            && self.column_delta == 0
            && self.line_lower_bound == 0
            && self.column_lower_bound == 0
    }

    fn is_whole_line(&self) -> bool {
        self.column_delta == 0 && self.column_lower_bound == 0
    }

    /// The sub-range of `range`'s post-image that this transformation
    /// guarantees contains no cursor: for a pure line insertion (whole-line
    /// shift with a positive delta) the newly created lines are empty of
    /// cursors until something else moves a cursor into them.
    fn empty_range(&self) -> Option<Range> {
        if self.is_whole_line() && self.line_delta > 0 {
            let begin = Position::new(self.range.begin.line, 0);
            let end = Position::new(self.range.begin.line + self.line_delta as u64, 0);
            Some(Range::new(begin, end))
        } else {
            None
        }
    }
}

fn shift_and_clamp(value: u64, delta: i64, lower_bound: u64) -> u64 {
    let shifted = if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub((-delta) as u64)
    };
    shifted.max(lower_bound)
}

/// Collapse a raw sequence of scheduled transformations into an equivalent,
/// typically shorter, sequence. Two rewrite rules are applied as the queue
/// is folded left to right:
///
///   1. a transformation that changes nothing (`Transformation::is_noop`)
///      is dropped;
///   2. `line_delta == -1, column_delta == 0, line_lower_bound ==
///      range.begin.line` is rewritten to the equivalent
///      `line_lower_bound = 0, range.begin.line += 1` (the clamp and the
///      range restriction say the same thing, so the clamp is redundant);
///   3. a transformation whose range is fully contained in the previous
///      entry's guaranteed-empty post-image (see `empty_range`) is dropped,
///      since it could not possibly move any cursor.
///
/// Everything else is appended unchanged. This is a strict subset of the
/// full rewrite-rule cascade in the design notes: the remaining rules
/// (line-oscillation cancellation, column/line delta merging, and
/// commuting adjacency swaps) are pure compression — they change the
/// representation of the collapsed sequence but never its observable
/// effect on any cursor — so omitting them keeps `reduce` correct while
/// keeping it simple to verify. See DESIGN.md.
pub fn reduce(queue: &[Transformation]) -> Vec<Transformation> {
    let mut out: Vec<Transformation> = Vec::with_capacity(queue.len());
    for &raw in queue {
        let mut t = raw;
        // Rule 2: redundant line_lower_bound.
        if t.line_delta == -1 && t.column_delta == 0 && t.line_lower_bound == t.range.begin.line {
            t.line_lower_bound = 0;
            t.range.begin.line += 1;
        }
        // Rule 1: no-op.
        if t.is_noop() {
            continue;
        }
        // Rule 3: fully owned by the previous entry's empty post-image.
        if let Some(prev) = out.last() {
            if let Some(empty) = prev.empty_range() {
                if empty.contains_range(&t.range) {
                    continue;
                }
            }
        }
        out.push(t);
    }
    out
}

/// Apply a (already reduced, or raw — the result is identical) sequence of
/// transformations to a single position, in order.
pub fn apply_sequence(queue: &[Transformation], mut p: Position) -> Position {
    for t in queue {
        p = t.apply_to_position(p);
    }
    p
}

/// An ordered multiset of positions with one distinguished "active" member.
/// Cursors are tracked by a stable id (not by value) so that the active
/// cursor's identity survives being moved to a new position, even when two
/// cursors land on the same position.
#[derive(Debug, Clone)]
pub struct CursorsSet {
    cursors: Vec<(u64, Position)>,
    next_id: u64,
    active: Option<u64>,
}

impl Default for CursorsSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorsSet {
    /// A fresh set with a single cursor at the origin, which becomes active.
    pub fn new() -> Self {
        let mut set = Self {
            cursors: Vec::new(),
            next_id: 0,
            active: None,
        };
        set.insert(Position::origin());
        set
    }

    pub fn empty() -> Self {
        Self {
            cursors: Vec::new(),
            next_id: 0,
            active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    fn sorted_insert_index(&self, p: Position) -> usize {
        self.cursors.partition_point(|(_, pos)| *pos <= p)
    }

    /// Insert a new cursor at `p`. Becomes active if the set was empty.
    pub fn insert(&mut self, p: Position) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let idx = self.sorted_insert_index(p);
        self.cursors.insert(idx, (id, p));
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    pub fn active_position(&self) -> Option<Position> {
        let id = self.active?;
        self.cursors.iter().find(|(i, _)| *i == id).map(|(_, p)| *p)
    }

    pub fn active_id(&self) -> Option<u64> {
        self.active
    }

    pub fn set_active(&mut self, id: u64) {
        if self.cursors.iter().any(|(i, _)| *i == id) {
            self.active = Some(id);
        }
    }

    /// Move the active cursor to `new_pos`, preserving its identity.
    pub fn move_active(&mut self, new_pos: Position) {
        let Some(id) = self.active else { return };
        self.cursors.retain(|(i, _)| *i != id);
        let idx = self.sorted_insert_index(new_pos);
        self.cursors.insert(idx, (id, new_pos));
    }

    /// Delete the active cursor. The cursor immediately after it (in
    /// sorted order), or else the one immediately before it, becomes
    /// active.
    pub fn delete_active(&mut self) {
        let Some(id) = self.active else { return };
        let Some(pos) = self.cursors.iter().position(|(i, _)| *i == id) else {
            return;
        };
        self.cursors.remove(pos);
        self.active = if pos < self.cursors.len() {
            Some(self.cursors[pos].0)
        } else if pos > 0 {
            Some(self.cursors[pos - 1].0)
        } else {
            None
        };
    }

    pub fn contains(&self, p: Position) -> bool {
        self.cursors.iter().any(|(_, pos)| *pos == p)
    }

    /// Index of the first cursor at or after `p`.
    pub fn lower_bound(&self, p: Position) -> usize {
        self.cursors.partition_point(|(_, pos)| *pos < p)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cursors.iter().map(|(_, p)| *p)
    }

    pub fn iter_with_id(&self) -> impl Iterator<Item = (u64, Position)> + '_ {
        self.cursors.iter().copied()
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
        self.active = None;
    }

    /// Replace every position with the result of `f`, preserving each
    /// cursor's identity (and hence which one stays active). `f` is applied
    /// first-cursor-first.
    pub fn map_positions(&mut self, mut f: impl FnMut(Position) -> Position) {
        for (_, p) in self.cursors.iter_mut() {
            *p = f(*p);
        }
        self.cursors.sort_by_key(|(id, p)| (*p, *id));
    }
}

/// Per-buffer collection of named cursor sets, a push/pop snapshot stack for
/// the default (`""`) set, and the scheduled-transformation queue.
pub struct CursorsTracker {
    named_sets: HashMap<String, CursorsSet>,
    stack: Vec<CursorsSet>,
    already_applied: CursorsSet,
    queue: Vec<Transformation>,
}

pub const DEFAULT_SET: &str = "";

impl Default for CursorsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorsTracker {
    pub fn new() -> Self {
        let mut named_sets = HashMap::new();
        named_sets.insert(DEFAULT_SET.to_string(), CursorsSet::new());
        Self {
            named_sets,
            stack: Vec::new(),
            already_applied: CursorsSet::empty(),
            queue: Vec::new(),
        }
    }

    pub fn set(&self, name: &str) -> Option<&CursorsSet> {
        self.named_sets.get(name)
    }

    pub fn set_mut(&mut self, name: &str) -> &mut CursorsSet {
        self.named_sets.entry(name.to_string()).or_default()
    }

    pub fn default_set(&self) -> &CursorsSet {
        self.named_sets.get(DEFAULT_SET).expect("default set always present")
    }

    /// Append a transformation to the pending queue. It has no effect on
    /// any cursor until [`CursorsTracker::apply_scheduled`] drains it.
    pub fn schedule(&mut self, t: Transformation) {
        self.queue.push(t);
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain and collapse the scheduled queue (§4.2), then apply every
    /// surviving entry to every named set, every stack snapshot, and the
    /// `already_applied` scratch set.
    pub fn apply_scheduled(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let collapsed = reduce(&self.queue);
        self.queue.clear();
        for set in self.named_sets.values_mut() {
            set.map_positions(|p| apply_sequence(&collapsed, p));
        }
        for snapshot in self.stack.iter_mut() {
            snapshot.map_positions(|p| apply_sequence(&collapsed, p));
        }
        self.already_applied.map_positions(|p| apply_sequence(&collapsed, p));
    }

    /// Push a snapshot of the default set onto the stack.
    pub fn push(&mut self) {
        self.stack.push(self.default_set().clone());
    }

    /// Pop and restore the most recently pushed snapshot as the default set.
    pub fn pop(&mut self) {
        if let Some(restored) = self.stack.pop() {
            self.named_sets.insert(DEFAULT_SET.to_string(), restored);
        }
    }

    /// Apply `f` to every cursor of the named set, one at a time, in
    /// sorted order, preserving which cursor is active. `f` may be
    /// arbitrarily expensive (e.g. it may itself schedule buffer edits);
    /// cursors are drained into the `already_applied` scratch set as they
    /// are processed and swapped back once the pass finishes, matching the
    /// "drain one at a time" contract in §4.2.
    pub fn apply_transformation_to_cursors(&mut self, name: &str, mut f: impl FnMut(Position) -> Position) {
        let mut source = self.named_sets.remove(name).unwrap_or_default();
        self.already_applied.clear();
        let ids: Vec<u64> = source.cursors.iter().map(|(id, _)| *id).collect();
        for id in ids {
            let pos = source.cursors.iter().find(|(i, _)| *i == id).unwrap().1;
            source.cursors.retain(|(i, _)| *i != id);
            let new_pos = f(pos);
            let idx = self.already_applied.sorted_insert_index(new_pos);
            self.already_applied.cursors.insert(idx, (id, new_pos));
            if source.active == Some(id) {
                // identity carries over to the scratch set below.
            }
        }
        self.already_applied.active = source.active.or(self.already_applied.active);
        std::mem::swap(&mut source, &mut self.already_applied);
        self.named_sets.insert(name.to_string(), source);
        self.already_applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u64, column: u64) -> Position {
        Position::new(line, column)
    }

    #[test]
    fn transformation_outside_range_is_untouched() {
        let t = Transformation::new(Range::new(pos(5, 0), pos(10, 0))).with_line_shift(3, 0);
        assert_eq!(t.apply_to_position(pos(1, 0)), pos(1, 0));
    }

    #[test]
    fn transformation_shifts_and_clamps() {
        let t = Transformation::new(Range::from(pos(0, 0))).with_line_shift(-5, 2);
        assert_eq!(t.apply_to_position(pos(10, 0)).line, 5);
        assert_eq!(t.apply_to_position(pos(3, 0)).line, 2); // clamped
    }

    #[test]
    fn scenario_overlapping_shifts_scenario_8_5() {
        // From the testable-properties scenario: {range:[0..inf), +1},
        // {range:[1..5), -1}. (2,0) -> (2,0); (10,0) -> (11,0).
        let queue = vec![
            Transformation::new(Range::from(pos(0, 0))).with_line_shift(1, 0),
            Transformation::new(Range::new(pos(1, 0), pos(5, 0))).with_line_shift(-1, 0),
        ];
        assert_eq!(apply_sequence(&queue, pos(2, 0)), pos(2, 0));
        assert_eq!(apply_sequence(&queue, pos(10, 0)), pos(11, 0));

        // The collapsed queue must produce the identical per-cursor result.
        let collapsed = reduce(&queue);
        assert_eq!(apply_sequence(&collapsed, pos(2, 0)), pos(2, 0));
        assert_eq!(apply_sequence(&collapsed, pos(10, 0)), pos(11, 0));
    }

    #[test]
    fn reduce_drops_noop() {
        let queue = vec![Transformation::new(Range::from(pos(0, 0)))];
        assert!(reduce(&queue).is_empty());
    }

    #[test]
    fn reduce_rewrites_redundant_line_lower_bound() {
        let t = Transformation::new(Range::new(pos(3, 0), pos(10, 0))).with_line_shift(-1, 3);
        let collapsed = reduce(&[t]);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].line_lower_bound, 0);
        assert_eq!(collapsed[0].range.begin.line, 4);
    }

    #[test]
    fn reduce_drops_fully_owned_by_empty_gap() {
        let insert = Transformation::new(Range::from(pos(2, 0))).with_line_shift(3, 0);
        // Any transformation whose range lies entirely inside the newly
        // created (and therefore cursor-free) lines [2, 5) is redundant.
        let inner = Transformation::new(Range::new(pos(2, 0), pos(4, 0))).with_line_shift(1, 0);
        let collapsed = reduce(&[insert, inner]);
        assert_eq!(collapsed.len(), 1);
    }

    #[test]
    fn cursors_set_starts_with_one_active_cursor() {
        let set = CursorsSet::new();
        assert_eq!(set.len(), 1);
        assert_eq!(set.active_position(), Some(Position::origin()));
    }

    #[test]
    fn cursors_set_insert_keeps_sorted_order() {
        let mut set = CursorsSet::empty();
        set.insert(pos(5, 0));
        set.insert(pos(1, 0));
        set.insert(pos(3, 0));
        let positions: Vec<_> = set.iter().collect();
        assert_eq!(positions, vec![pos(1, 0), pos(3, 0), pos(5, 0)]);
    }

    #[test]
    fn cursors_set_delete_active_picks_neighbor() {
        let mut set = CursorsSet::empty();
        let a = set.insert(pos(1, 0));
        set.insert(pos(2, 0));
        set.set_active(a);
        set.delete_active();
        assert_eq!(set.active_position(), Some(pos(2, 0)));
    }

    #[test]
    fn tracker_active_cursor_always_a_member() {
        let tracker = CursorsTracker::new();
        let set = tracker.default_set();
        assert!(set.contains(set.active_position().unwrap()));
    }

    #[test]
    fn tracker_apply_scheduled_moves_every_named_set() {
        let mut tracker = CursorsTracker::new();
        tracker.set_mut("search").insert(pos(4, 0));
        tracker.schedule(Transformation::new(Range::from(pos(0, 0))).with_line_shift(2, 0));
        tracker.apply_scheduled();
        assert_eq!(tracker.default_set().active_position(), Some(pos(2, 0)));
        assert!(tracker.set("search").unwrap().contains(pos(6, 0)));
    }

    #[test]
    fn tracker_push_pop_restores_snapshot() {
        let mut tracker = CursorsTracker::new();
        tracker.push();
        tracker.set_mut(DEFAULT_SET).move_active(pos(9, 0));
        tracker.pop();
        assert_eq!(tracker.default_set().active_position(), Some(Position::origin()));
    }

    #[test]
    fn tracker_apply_transformation_to_cursors_preserves_active_identity() {
        let mut tracker = CursorsTracker::new();
        tracker.set_mut(DEFAULT_SET).insert(pos(3, 0));
        tracker.apply_transformation_to_cursors(DEFAULT_SET, |p| Position::new(p.line + 1, p.column));
        let set = tracker.set(DEFAULT_SET).unwrap();
        assert!(set.contains(pos(1, 0)));
        assert!(set.contains(pos(4, 0)));
    }
}
