use snip::Snippet;

use crate::index::ActionIndex;

/// The happens-before relation over all actions, as a dense boolean matrix.
///
/// A dense representation is deliberate: the closure is cubic in the action
/// count regardless, and action counts are small.  One matrix is allocated
/// per analysis and rebuilt for each synchronization order.
pub struct HappensBefore {
    /// Number of actions along each axis
    actions: usize,
    /// Row-major adjacency: `matrix[a * actions + b]` holds HB(a, b)
    matrix: Vec<bool>,
}

impl HappensBefore {
    /// An empty relation over `actions` actions.
    pub fn new(actions: usize) -> Self {
        Self {
            actions,
            matrix: vec![false; actions * actions],
        }
    }

    /// Whether `a` happens-before `b`.  Reflexive after a rebuild.
    pub fn relates(&self, a: usize, b: usize) -> bool {
        self.matrix[a * self.actions + b]
    }

    /// Records HB(a, b).
    fn set(&mut self, a: usize, b: usize) {
        self.matrix[a * self.actions + b] = true;
    }

    /// Rebuilds the relation for one synchronization order.
    ///
    /// Seeds reflexivity, the program-order skeleton (consecutive actions
    /// of each thread), and the synchronizes-with edges: every unlock to
    /// every later lock of the same monitor, and every volatile write to
    /// every later read of the same volatile, both in synchronization-order
    /// positions.  The transitive closure completes the relation.
    pub fn rebuild(
        &mut self,
        snippets: &[Snippet],
        index: &ActionIndex,
        order: &[usize],
    ) {
        self.matrix.fill(false);
        for action in 0..self.actions {
            self.set(action, action);
        }

        for (thread, snippet) in snippets.iter().enumerate() {
            for slot in 1..snippet.action_count() {
                self.set(
                    index.global(thread, slot - 1),
                    index.global(thread, slot),
                );
            }
        }

        for (position, &earlier) in order.iter().enumerate() {
            let action = index.action(snippets, earlier);
            if action.is_unlock() {
                for &later in &order[position + 1..] {
                    let candidate = index.action(snippets, later);
                    if candidate.is_lock()
                        && candidate.monitor_name() == action.monitor_name()
                    {
                        self.set(earlier, later);
                    }
                }
            } else if action.is_volatile_write() {
                for &later in &order[position + 1..] {
                    let candidate = index.action(snippets, later);
                    if candidate.is_volatile_read()
                        && candidate.volatile_name() == action.volatile_name()
                    {
                        self.set(earlier, later);
                    }
                }
            }
        }

        for via in 0..self.actions {
            for from in 0..self.actions {
                if self.relates(from, via) {
                    for to in 0..self.actions {
                        if self.relates(via, to) {
                            self.set(from, to);
                        }
                    }
                }
            }
        }

        debug_assert!(
            self.is_antisymmetric(),
            "happens-before must be a partial order"
        );
    }

    /// No two distinct actions may relate in both directions.
    fn is_antisymmetric(&self) -> bool {
        (0..self.actions).all(|a| {
            (0..self.actions).all(|b| {
                a == b || !self.relates(a, b) || !self.relates(b, a)
            })
        })
    }
}
