//! Tree-walking code generator: lowers an `Ast` to a linear
//! `Vec<Instruction>`. Core module — see spec.md §4.2 / SPEC_FULL.md §4.6,
//! grounded in `original_source/src/codegen.c`.

use crate::ast::{Ast, BinaryOp, UnaryOp};
use crate::diagnostics::Diagnostics;
use crate::inst::{Instruction, Opcode};
use crate::label::{LabelId, LabelTable};
use crate::symbol::{ConstTable, FuncTable, VarTable};

pub struct Codegen {
    insts: Vec<Instruction>,
    labels: LabelTable,
    consts: ConstTable,
    funcs: FuncTable,
    vars: VarTable,
    label_continue: Option<LabelId>,
    label_break: Option<LabelId>,
    stack_depth: i32,
    pub diagnostics: Diagnostics,
}

pub struct CodegenOutput {
    pub instructions: Vec<Instruction>,
    pub labels: LabelTable,
    pub errors: u32,
}

impl Codegen {
    pub fn new() -> Codegen {
        Codegen {
            insts: Vec::new(),
            labels: LabelTable::new(),
            consts: ConstTable::new(),
            funcs: FuncTable::new(),
            vars: VarTable::new(),
            label_continue: None,
            label_break: None,
            stack_depth: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    fn emit(&mut self, inst: Instruction) {
        self.insts.push(inst);
    }

    fn alloc_label(&mut self) -> LabelId {
        self.labels.alloc()
    }

    fn place_label(&mut self, label: LabelId) {
        self.emit(Instruction::with_label(Opcode::Label, label));
    }

    /// Runs the full pipeline: prologue, const prepass, body walk, `main`
    /// check, label fusion. See spec.md §4.2.
    pub fn generate(mut self, program: &Ast) -> CodegenOutput {
        let labels = &mut self.labels;
        let main_label = self.funcs.reference("main", || labels.alloc());

        self.collect_consts(program);

        self.emit(Instruction::with_label(Opcode::Call, main_label));
        self.emit(Instruction::bare(Opcode::Halt));

        self.gen(program);

        if !self.funcs.is_resolved("main") {
            self.diagnostics
                .report("error: function 'main' is not defined.");
        }

        self.fuse_labels();

        CodegenOutput {
            instructions: self.insts,
            labels: self.labels,
            errors: self.diagnostics.count(),
        }
    }

    fn collect_consts(&mut self, node: &Ast) {
        match node {
            Ast::Seq(children) => {
                for child in children {
                    self.collect_consts(child);
                }
            }
            Ast::Group { inner, .. } => self.collect_consts(inner),
            Ast::ConstStatement { ident, value } => {
                let name = ident.ident_name();
                if !self.consts.define(name, *value) {
                    self.diagnostics
                        .report(format!("error: constant '{}' is redefined.", name));
                }
            }
            _ => {}
        }
    }

    fn fuse_labels(&mut self) {
        let mut i = 0;
        while i + 1 < self.insts.len() {
            if self.insts[i].is_label() && self.insts[i + 1].is_label() {
                let a = label_of(&self.insts[i]);
                let b = label_of(&self.insts[i + 1]);
                self.labels.unify(a, b);
            }
            i += 1;
        }
    }

    // -- statement lowering --------------------------------------------

    fn gen(&mut self, node: &Ast) {
        match node {
            Ast::Seq(children) => {
                for child in children {
                    self.gen(child);
                }
            }
            Ast::Group { inner, .. } => self.gen(inner),
            Ast::Empty | Ast::Invalid => {}
            Ast::Expr(e) => {
                self.stack_depth = 0;
                self.gen_expr(e);
                self.emit(Instruction::bare(Opcode::Pop));
            }
            Ast::If { cond, then, els } => self.gen_if(cond, then, els.as_deref()),
            Ast::While { cond, body } => self.gen_while(cond, body),
            Ast::LoopStatement(body) => self.gen_loop(body),
            Ast::ForStatement {
                init,
                cond,
                next,
                body,
            } => self.gen_for(init, cond, next, body),
            Ast::Break => {
                match self.label_break {
                    Some(label) => self.emit(Instruction::with_label(Opcode::Jmp, label)),
                    None => self
                        .diagnostics
                        .report("error: illegal break statement."),
                }
            }
            Ast::Continue => {
                match self.label_continue {
                    Some(label) => self.emit(Instruction::with_label(Opcode::Jmp, label)),
                    None => self
                        .diagnostics
                        .report("error: illegal continue statement."),
                }
            }
            Ast::Puti(e) => {
                self.stack_depth = 0;
                self.gen_expr(e);
                self.emit(Instruction::bare(Opcode::Puti));
            }
            Ast::Putc(e) => {
                self.stack_depth = 0;
                self.gen_expr(e);
                self.emit(Instruction::bare(Opcode::Putc));
            }
            Ast::Geti(ident) => self.gen_input(ident, Opcode::Geti),
            Ast::Getc(ident) => self.gen_input(ident, Opcode::Getc),
            Ast::ArrayDecl { ident, capacity } => {
                self.vars.declare(ident.ident_name(), *capacity);
            }
            Ast::Func {
                ident,
                params,
                body,
            } => self.gen_func(ident, params, body),
            Ast::Return(e) => {
                self.stack_depth = 0;
                self.gen_expr(e);
                self.emit(Instruction::bare(Opcode::Ret));
            }
            Ast::Halt => self.emit(Instruction::bare(Opcode::Halt)),
            Ast::ConstStatement { .. } => {}
            other => panic!("gen called on an expression node: {:?}", other),
        }
    }

    fn gen_input(&mut self, ident: &Ast, opcode: Opcode) {
        let name = ident.ident_name();
        match self.vars.lookup(name) {
            Some(entry) if entry.is_local => {
                self.diagnostics
                    .report("error: function parameter is readonly.");
            }
            Some(entry) => {
                let offset = entry.offset;
                self.emit(Instruction::with_int(Opcode::Push, offset));
                self.emit(Instruction::bare(opcode));
            }
            None => {
                self.diagnostics
                    .report(format!("error: undefined variable '{}'.", name));
            }
        }
    }

    fn gen_if(&mut self, cond: &Ast, then: &Ast, els: Option<&Ast>) {
        self.stack_depth = 0;
        self.gen_expr(cond);
        let l1 = self.alloc_label();
        self.emit(Instruction::with_label(Opcode::Jz, l1));
        self.gen(then);

        match els {
            Some(els) => {
                let l2 = self.alloc_label();
                self.emit(Instruction::with_label(Opcode::Jmp, l2));
                self.place_label(l1);
                self.gen(els);
                self.place_label(l2);
            }
            None => self.place_label(l1),
        }
    }

    fn gen_while(&mut self, cond: &Ast, body: &Ast) {
        let lc = self.alloc_label();
        let lb = self.alloc_label();

        self.place_label(lc);
        self.stack_depth = 0;
        self.gen_expr(cond);
        self.emit(Instruction::with_label(Opcode::Jz, lb));

        let (saved_c, saved_b) = (self.label_continue, self.label_break);
        self.label_continue = Some(lc);
        self.label_break = Some(lb);
        self.gen(body);
        self.label_continue = saved_c;
        self.label_break = saved_b;

        self.emit(Instruction::with_label(Opcode::Jmp, lc));
        self.place_label(lb);
    }

    fn gen_loop(&mut self, body: &Ast) {
        let lc = self.alloc_label();
        let lb = self.alloc_label();

        self.place_label(lc);

        let (saved_c, saved_b) = (self.label_continue, self.label_break);
        self.label_continue = Some(lc);
        self.label_break = Some(lb);
        self.gen(body);
        self.label_continue = saved_c;
        self.label_break = saved_b;

        self.emit(Instruction::with_label(Opcode::Jmp, lc));
        self.place_label(lb);
    }

    fn gen_for(&mut self, init: &Ast, cond: &Ast, next: &Ast, body: &Ast) {
        let lh = self.alloc_label();
        let lc = self.alloc_label();
        let lb = self.alloc_label();

        if !matches!(init, Ast::Empty) {
            self.stack_depth = 0;
            self.gen_expr(init);
            self.emit(Instruction::bare(Opcode::Pop));
        }

        self.place_label(lh);
        if !matches!(cond, Ast::Empty) {
            self.stack_depth = 0;
            self.gen_expr(cond);
            self.emit(Instruction::with_label(Opcode::Jz, lb));
        }

        let (saved_c, saved_b) = (self.label_continue, self.label_break);
        self.label_continue = Some(lc);
        self.label_break = Some(lb);
        self.gen(body);
        self.label_continue = saved_c;
        self.label_break = saved_b;

        self.place_label(lc);
        if !matches!(next, Ast::Empty) {
            self.stack_depth = 0;
            self.gen_expr(next);
            self.emit(Instruction::bare(Opcode::Pop));
        }
        self.emit(Instruction::with_label(Opcode::Jmp, lh));
        self.place_label(lb);
    }

    fn gen_func(&mut self, ident: &Ast, params: &Ast, body: &Ast) {
        let name = ident.ident_name();
        let param_count = match params {
            Ast::FuncParam(list) => list.len(),
            _ => 0,
        };

        let labels = &mut self.labels;
        let label = self.funcs.reference(name, || labels.alloc());
        let (label, first_time) = self.funcs.define(name, param_count, || label);

        if !first_time {
            self.diagnostics
                .report(format!("error: function '{}' is redefined.", name));
        }

        self.vars.enter_function();
        if let Ast::FuncParam(list) = params {
            for param in list {
                self.vars.declare_param(param.ident_name());
            }
        }

        self.place_label(label);
        self.gen(body);

        self.vars.exit_function();
    }

    // -- expression lowering ---------------------------------------------

    fn gen_expr(&mut self, node: &Ast) {
        match node {
            Ast::Group { inner, .. } => self.gen_expr(inner),
            Ast::Integer(v) => {
                self.emit(Instruction::with_int(Opcode::Push, *v));
                self.stack_depth += 1;
            }
            Ast::Variable(ident) => self.gen_variable(ident),
            Ast::Array { ident, index } => self.gen_array(ident, index),
            Ast::FuncCall { ident, args } => self.gen_call(ident, args),
            Ast::Assign { lhs, rhs } => self.gen_assign(lhs, rhs),
            Ast::Unary { op, operand } => self.gen_unary(*op, operand),
            Ast::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs),
            other => panic!("gen_expr called on a non-expression node: {:?}", other),
        }
    }

    fn gen_variable(&mut self, ident: &Ast) {
        let name = ident.ident_name();
        if let Some(value) = self.consts.get(name) {
            self.emit(Instruction::with_int(Opcode::Push, value));
            self.stack_depth += 1;
            return;
        }

        match self.vars.lookup(name) {
            Some(entry) if entry.is_local => {
                let offset = self.stack_depth + entry.offset;
                self.emit(Instruction::with_int(Opcode::Copy, offset));
            }
            Some(entry) => {
                let offset = entry.offset;
                self.emit(Instruction::with_int(Opcode::Push, offset));
                self.emit(Instruction::bare(Opcode::Load));
            }
            None => {
                self.diagnostics
                    .report(format!("error: undefined variable '{}'.", name));
            }
        }
        self.stack_depth += 1;
    }

    fn gen_array(&mut self, ident: &Ast, index: &Ast) {
        let name = ident.ident_name();
        match self.vars.lookup(name) {
            Some(entry) if entry.is_local => {
                self.diagnostics
                    .report("error: function parameter is not array.");
                self.stack_depth += 1;
            }
            Some(entry) => {
                let offset = entry.offset;
                self.emit(Instruction::with_int(Opcode::Push, offset));
                self.stack_depth += 1;
                self.gen_expr(index);
                self.emit(Instruction::bare(Opcode::Add));
                self.emit(Instruction::bare(Opcode::Load));
                self.stack_depth -= 1;
            }
            None => {
                self.diagnostics
                    .report(format!("error: undefined array '{}'.", name));
                self.stack_depth += 1;
            }
        }
    }

    fn gen_call(&mut self, ident: &Ast, args: &Ast) {
        let name = ident.ident_name();
        let arg_list: &[Ast] = match args {
            Ast::FuncCallArg(list) => list,
            _ => &[],
        };

        for arg in arg_list.iter().rev() {
            self.gen_expr(arg);
        }

        let labels = &mut self.labels;
        let label = self.funcs.reference(name, || labels.alloc());
        self.emit(Instruction::with_label(Opcode::Call, label));
        self.stack_depth += 1;

        self.emit(Instruction::with_int(Opcode::Slide, arg_list.len() as i32));
        self.stack_depth -= arg_list.len() as i32;
    }

    fn gen_assign(&mut self, lhs: &Ast, rhs: &Ast) {
        // `rhs` is always lowered first, unconditionally, matching
        // `gen_assign` in original_source/src/codegen.c: the right-hand
        // side is generated before the switch over the lhs node type even
        // runs, so an invalid target still leaves best-effort code for
        // whatever `rhs` itself does.
        self.gen_expr(rhs);

        if !lhs.is_assignable() {
            self.diagnostics
                .report("error: left hand side of assignment should be variable or array.");
            return;
        }

        match lhs {
            Ast::Variable(ident) => {
                let name = ident.ident_name();
                if self.consts.contains(name) {
                    self.diagnostics.report(format!(
                        "error: cannot assign to '{}' defined as a constant.",
                        name
                    ));
                    return;
                }
                match self.vars.lookup(name) {
                    Some(entry) if entry.is_local => {
                        self.diagnostics
                            .report("error: function parameter is readonly.");
                        return;
                    }
                    Some(entry) => {
                        let offset = entry.offset;
                        self.emit(Instruction::with_int(Opcode::Push, offset));
                        self.stack_depth += 1;
                    }
                    None => {
                        self.diagnostics
                            .report(format!("error: undefined variable '{}'.", name));
                        return;
                    }
                }
            }
            Ast::Array { ident, index } => {
                let name = ident.ident_name();
                match self.vars.lookup(name) {
                    Some(entry) if entry.is_local => {
                        self.diagnostics
                            .report("error: function parameter is not array.");
                        return;
                    }
                    Some(entry) => {
                        let offset = entry.offset;
                        self.emit(Instruction::with_int(Opcode::Push, offset));
                        self.stack_depth += 1;
                        self.gen_expr(index);
                        self.emit(Instruction::bare(Opcode::Add));
                        self.stack_depth -= 1;
                    }
                    None => {
                        self.diagnostics
                            .report(format!("error: undefined array '{}'.", name));
                        return;
                    }
                }
            }
            _ => {}
        }

        self.emit(Instruction::with_int(Opcode::Copy, 1));
        self.emit(Instruction::bare(Opcode::Store));
        self.stack_depth -= 1;
    }

    fn gen_unary(&mut self, op: UnaryOp, operand: &Ast) {
        match op {
            UnaryOp::Positive => self.gen_expr(operand),
            UnaryOp::Negative => {
                self.emit(Instruction::with_int(Opcode::Push, 0));
                self.stack_depth += 1;
                self.gen_expr(operand);
                self.emit(Instruction::bare(Opcode::Sub));
                self.stack_depth -= 1;
            }
            UnaryOp::Not => {
                self.gen_expr(operand);
                let l1 = self.alloc_label();
                let l2 = self.alloc_label();
                self.emit(Instruction::with_label(Opcode::Jz, l1));
                self.emit(Instruction::with_int(Opcode::Push, 0));
                self.emit(Instruction::with_label(Opcode::Jmp, l2));
                self.place_label(l1);
                self.emit(Instruction::with_int(Opcode::Push, 1));
                self.place_label(l2);
            }
        }
    }

    fn gen_binary(&mut self, op: BinaryOp, lhs: &Ast, rhs: &Ast) {
        // Both operands are always lowered first, even for OR/AND: the
        // original evaluates both sides unconditionally and only uses
        // the branches below to synthesize a boolean result, since the
        // machine has no logical operators (see DESIGN.md — this is not
        // a true short-circuit).
        self.gen_expr(lhs);
        self.gen_expr(rhs);

        match op {
            BinaryOp::Add => self.emit(Instruction::bare(Opcode::Add)),
            BinaryOp::Sub => self.emit(Instruction::bare(Opcode::Sub)),
            BinaryOp::Mul => self.emit(Instruction::bare(Opcode::Mul)),
            BinaryOp::Div => self.emit(Instruction::bare(Opcode::Div)),
            BinaryOp::Mod => self.emit(Instruction::bare(Opcode::Mod)),
            BinaryOp::Eq => self.gen_compare(Opcode::Sub, Opcode::Jz, true),
            BinaryOp::Neq => self.gen_compare(Opcode::Sub, Opcode::Jz, false),
            BinaryOp::Lt => self.gen_compare(Opcode::Sub, Opcode::Jneg, true),
            BinaryOp::Gt => {
                self.emit(Instruction::bare(Opcode::Swap));
                self.gen_compare(Opcode::Sub, Opcode::Jneg, true);
            }
            BinaryOp::Le => {
                self.emit(Instruction::bare(Opcode::Swap));
                self.gen_compare(Opcode::Sub, Opcode::Jneg, false);
            }
            BinaryOp::Ge => self.gen_compare(Opcode::Sub, Opcode::Jneg, false),
            BinaryOp::Or => self.gen_or_branch(),
            BinaryOp::And => self.gen_and_branch(),
        }

        self.stack_depth -= 1;
    }

    /// Shared skeleton for every comparison: subtract, branch on `test`,
    /// push 1 on the taken path and 0 on the fallthrough (or the reverse
    /// when `taken_is_true` is false).
    fn gen_compare(&mut self, sub: Opcode, test: Opcode, taken_is_true: bool) {
        self.emit(Instruction::bare(sub));
        let l1 = self.alloc_label();
        let l2 = self.alloc_label();
        self.emit(Instruction::with_label(test, l1));
        self.emit(Instruction::with_int(Opcode::Push, if taken_is_true { 0 } else { 1 }));
        self.emit(Instruction::with_label(Opcode::Jmp, l2));
        self.place_label(l1);
        self.emit(Instruction::with_int(Opcode::Push, if taken_is_true { 1 } else { 0 }));
        self.place_label(l2);
    }

    /// Both operands are already on the stack (`a`, then `b` on top).
    /// Tests `b` first, falling back to `a` only if `b` was falsy.
    fn gen_or_branch(&mut self) {
        let l1 = self.alloc_label();
        let l2 = self.alloc_label();
        let l3 = self.alloc_label();

        self.emit(Instruction::with_label(Opcode::Jz, l1));
        self.emit(Instruction::bare(Opcode::Pop));
        self.emit(Instruction::with_int(Opcode::Push, 1));
        self.emit(Instruction::with_label(Opcode::Jmp, l3));

        self.place_label(l1);
        self.emit(Instruction::with_label(Opcode::Jz, l2));
        self.emit(Instruction::with_int(Opcode::Push, 1));
        self.emit(Instruction::with_label(Opcode::Jmp, l3));

        self.place_label(l2);
        self.emit(Instruction::with_int(Opcode::Push, 0));
        self.place_label(l3);
    }

    fn gen_and_branch(&mut self) {
        let l1 = self.alloc_label();
        let l2 = self.alloc_label();
        let l3 = self.alloc_label();
        let l4 = self.alloc_label();

        self.emit(Instruction::with_label(Opcode::Jz, l1));
        self.emit(Instruction::with_label(Opcode::Jz, l2));
        self.emit(Instruction::with_label(Opcode::Jmp, l3));

        self.place_label(l1);
        self.emit(Instruction::bare(Opcode::Pop));
        self.place_label(l2);
        self.emit(Instruction::with_int(Opcode::Push, 0));
        self.emit(Instruction::with_label(Opcode::Jmp, l4));

        self.place_label(l3);
        self.emit(Instruction::with_int(Opcode::Push, 1));
        self.place_label(l4);
    }
}

fn label_of(inst: &Instruction) -> LabelId {
    match inst.operand {
        crate::inst::Operand::Label(id) => id,
        _ => panic!("label_of called on a non-label instruction"),
    }
}
