//! Constant, function and variable symbol tables used by the code
//! generator. See spec.md §3 / SPEC_FULL.md §4.4.

use std::collections::HashMap;

use crate::label::LabelId;

#[derive(Default)]
pub struct ConstTable {
    values: HashMap<String, i32>,
}

impl ConstTable {
    pub fn new() -> ConstTable {
        ConstTable::default()
    }

    /// Returns `false` (and leaves the table untouched) if `name` is
    /// already defined.
    pub fn define(&mut self, name: &str, value: i32) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

pub struct FuncEntry {
    pub label: LabelId,
    pub resolved: bool,
    pub param_count: usize,
}

#[derive(Default)]
pub struct FuncTable {
    funcs: HashMap<String, FuncEntry>,
}

impl FuncTable {
    pub fn new() -> FuncTable {
        FuncTable::default()
    }

    /// Returns the label for `name`, allocating an unresolved entry via
    /// `alloc_label` if this is the first reference (forward-call
    /// support — matches the original's eager-allocation-on-reference
    /// behavior).
    pub fn reference(&mut self, name: &str, alloc_label: impl FnOnce() -> LabelId) -> LabelId {
        if let Some(entry) = self.funcs.get(name) {
            return entry.label;
        }
        let label = alloc_label();
        self.funcs.insert(
            name.to_string(),
            FuncEntry {
                label,
                resolved: false,
                param_count: 0,
            },
        );
        label
    }

    /// Marks `name` as defined, returning `false` if it was already
    /// resolved (function redefinition).
    pub fn define(
        &mut self,
        name: &str,
        param_count: usize,
        alloc_label: impl FnOnce() -> LabelId,
    ) -> (LabelId, bool) {
        let label = self.reference(name, alloc_label);
        let entry = self.funcs.get_mut(name).expect("just referenced");
        if entry.resolved {
            return (label, false);
        }
        entry.resolved = true;
        entry.param_count = param_count;
        (label, true)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.funcs.get(name).map_or(false, |e| e.resolved)
    }
}

/// One entry in a variable scope: the declared name, its cell offset, and
/// whether it lives in a function's parameter scope (readonly).
#[derive(Clone)]
pub struct VarEntry {
    pub name: String,
    pub offset: i32,
    pub is_local: bool,
}

/// A single scope level, equivalent to one node of the original's
/// parent-chained `VarTable`.
#[derive(Default)]
pub struct VarScope {
    entries: Vec<VarEntry>,
    next_offset: i32,
    is_local: bool,
}

impl VarScope {
    fn new(is_local: bool) -> VarScope {
        VarScope {
            entries: Vec::new(),
            next_offset: 0,
            is_local,
        }
    }

    fn add(&mut self, name: &str, size: i32) -> i32 {
        let offset = self.next_offset;
        self.entries.push(VarEntry {
            name: name.to_string(),
            offset,
            is_local: self.is_local,
        });
        self.next_offset += size;
        offset
    }

    fn lookup(&self, name: &str) -> Option<&VarEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Global scope plus at most one active function scope, matching the
/// original's parent-chain lookup semantics (see DESIGN.md: codegen never
/// needs more than two live scopes, so the chain collapses to a fixed
/// two-level stack without changing behavior).
pub struct VarTable {
    global: VarScope,
    local: Option<VarScope>,
}

impl VarTable {
    pub fn new() -> VarTable {
        VarTable {
            global: VarScope::new(false),
            local: None,
        }
    }

    pub fn enter_function(&mut self) {
        self.local = Some(VarScope::new(true));
    }

    pub fn exit_function(&mut self) {
        self.local = None;
    }

    pub fn in_function(&self) -> bool {
        self.local.is_some()
    }

    /// Declares a scalar (size 1) or an array (size N) in the currently
    /// active scope (local if inside a function, global otherwise).
    pub fn declare(&mut self, name: &str, size: i32) -> i32 {
        match &mut self.local {
            Some(scope) => scope.add(name, size),
            None => self.global.add(name, size),
        }
    }

    /// Declares a function parameter in the active local scope.
    pub fn declare_param(&mut self, name: &str) -> i32 {
        self.local
            .as_mut()
            .expect("declare_param called outside a function scope")
            .add(name, 1)
    }

    /// Resolves `name`, checking the local scope first and falling
    /// through to globals, matching the parent-chain's lookup order.
    pub fn lookup(&self, name: &str) -> Option<&VarEntry> {
        if let Some(scope) = &self.local {
            if let Some(entry) = scope.lookup(name) {
                return Some(entry);
            }
        }
        self.global.lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_table_rejects_redefinition() {
        let mut consts = ConstTable::new();
        assert!(consts.define("K", 1));
        assert!(!consts.define("K", 2));
        assert_eq!(consts.get("K"), Some(1));
    }

    #[test]
    fn func_table_forward_reference_then_define() {
        let mut funcs = FuncTable::new();
        let mut next_label = 0usize;
        let mut alloc = || {
            let id = next_label;
            next_label += 1;
            id
        };
        let referenced = funcs.reference("f", &mut alloc);
        assert!(!funcs.is_resolved("f"));
        let (defined, first_time) = funcs.define("f", 1, &mut alloc);
        assert_eq!(referenced, defined);
        assert!(first_time);
        assert!(funcs.is_resolved("f"));
    }

    #[test]
    fn func_table_rejects_redefinition() {
        let mut funcs = FuncTable::new();
        let mut next_label = 0usize;
        let mut alloc = || {
            let id = next_label;
            next_label += 1;
            id
        };
        funcs.define("f", 0, &mut alloc);
        let (_, first_time) = funcs.define("f", 0, &mut alloc);
        assert!(!first_time);
    }

    #[test]
    fn var_table_local_shadows_global_and_falls_through() {
        let mut vars = VarTable::new();
        vars.declare("g", 1);
        vars.enter_function();
        vars.declare_param("p");
        assert!(vars.lookup("p").unwrap().is_local);
        assert!(!vars.lookup("g").unwrap().is_local);
        vars.exit_function();
        assert!(vars.lookup("p").is_none());
    }

    #[test]
    fn array_declaration_advances_offset_by_capacity() {
        let mut vars = VarTable::new();
        let first = vars.declare("a", 4);
        let second = vars.declare("b", 1);
        assert_eq!(first, 0);
        assert_eq!(second, 4);
    }
}
