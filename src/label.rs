//! Union-find label table. Allocates jump targets and later fuses adjacent
//! ones into a single resolved id. See SPEC_FULL.md §4.5, grounded in
//! `original_source/include/label.h` + `src/label.c`.

/// Opaque handle into a `LabelTable`. Indexes the arena directly, matching
/// the original's `label_t*` pointers one-to-one.
pub type LabelId = usize;

struct Label {
    id: u32,
    parent: Option<LabelId>,
}

#[derive(Default)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl LabelTable {
    pub fn new() -> LabelTable {
        LabelTable::default()
    }

    pub fn alloc(&mut self) -> LabelId {
        let id = self.labels.len();
        self.labels.push(Label {
            id: id as u32,
            parent: None,
        });
        id
    }

    pub fn count(&self) -> usize {
        self.labels.len()
    }

    fn root(&self, label: LabelId) -> LabelId {
        let mut l = label;
        while let Some(parent) = self.labels[l].parent {
            l = parent;
        }
        l
    }

    /// Points the root of `b` at the root of `a`, matching
    /// `ltable_unify`'s `l1`-is-target, `l2`-is-source convention.
    pub fn unify(&mut self, a: LabelId, b: LabelId) {
        let root_a = self.root(a);
        let root_b = self.root(b);
        if root_a != root_b {
            self.labels[root_b].parent = Some(root_a);
        }
    }

    /// Stable integer id serialized by the emitters.
    pub fn resolved_id(&self, label: LabelId) -> u32 {
        self.labels[self.root(label)].id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_labels_resolve_to_their_own_id() {
        let mut table = LabelTable::new();
        let a = table.alloc();
        let b = table.alloc();
        assert_eq!(table.resolved_id(a), 0);
        assert_eq!(table.resolved_id(b), 1);
    }

    #[test]
    fn unify_makes_both_resolve_to_the_same_id() {
        let mut table = LabelTable::new();
        let a = table.alloc();
        let b = table.alloc();
        table.unify(a, b);
        assert_eq!(table.resolved_id(a), table.resolved_id(b));
        assert_eq!(table.resolved_id(b), table.resolved_id(a));
    }

    #[test]
    fn chained_unify_follows_roots_without_compression() {
        let mut table = LabelTable::new();
        let a = table.alloc();
        let b = table.alloc();
        let c = table.alloc();
        table.unify(a, b);
        table.unify(b, c);
        assert_eq!(table.resolved_id(c), table.resolved_id(a));
    }
}
