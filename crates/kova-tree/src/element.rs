//! Element arena for the resolved tree.
//!
//! Elements are stored in a flat arena and addressed by `ElementId`. Each
//! element has a kind tag and an index into a per-kind payload pool, the same
//! layout the parser uses for AST nodes. Parent pointers are maintained at
//! creation time: children are always created before their parents, so every
//! `add_*` method links the freshly created element as the parent of its
//! owned children.
//!
//! References that are *not* ownership edges (a when-subject wrapper pointing
//! back at its `when`, a jump pointing at its target function or loop) do not
//! update parent pointers.

use crate::symbol::SymbolId;
use crate::types::TypeId;
use smallvec::SmallVec;

/// Index of an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl ElementId {
    pub const NONE: ElementId = ElementId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Kind tag of a tree element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A resolved reference: `x`, `a.b`, `this.p`, or a call target.
    QualifiedAccess,
    /// The implicit reference to the subject inside a `when` branch.
    WhenSubject,
    When,
    WhenBranch,
    /// An expression whose type was narrowed by the data-flow analysis.
    SmartCast,
    /// `a?.b`; evaluates the selector only when the receiver is non-null.
    SafeCall,
    /// The checked, non-null view of a safe call's receiver.
    CheckedSafeCallSubject,
    /// `x!!`.
    CheckNotNull,
    /// The value reference produced when desugaring `a += b` into `a = a + b`.
    DesugaredAssignmentValueRef,
    Assignment,
    /// `x as T` or `x as? T`.
    Cast,
    Return,
    Break,
    Continue,
    Block,
    Function,
    AnonymousFunction,
    Loop,
    /// A local property/variable declaration with an optional initializer.
    Declaration,
    Throw,
    Literal,
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct Element {
    pub kind: ElementKind,
    data: u32,
}

#[derive(Debug, Clone, Copy)]
struct ElementInfo {
    parent: ElementId,
    ty: TypeId,
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone)]
pub struct QualifiedAccessData {
    /// The resolved callee symbol.
    pub callee: SymbolId,
    /// Receiver the member is dispatched on, or `NONE`.
    pub dispatch_receiver: ElementId,
    /// Extension receiver, or `NONE`.
    pub extension_receiver: ElementId,
    /// Whether the callee reference is a `this` reference.
    pub is_this: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct WhenSubjectData {
    /// The enclosing `when` expression this wrapper refers back to.
    pub when_expr: ElementId,
}

#[derive(Debug, Clone)]
pub struct WhenData {
    /// Subject variable declaration (`when (val x = ...)`), or `NONE`.
    pub subject_variable: ElementId,
    /// Subject expression, or `NONE`.
    pub subject: ElementId,
    pub branches: Vec<ElementId>,
}

#[derive(Debug, Clone, Copy)]
pub struct WhenBranchData {
    pub condition: ElementId,
    pub result: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct SmartCastData {
    /// The original expression before narrowing.
    pub original: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct SafeCallData {
    pub receiver: ElementId,
    /// The selector that is actually evaluated when the receiver is non-null.
    pub selector: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckedSubjectData {
    /// Back-reference to the safe call's receiver expression.
    pub original_receiver: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckNotNullData {
    pub argument: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct AssignmentValueRefData {
    /// Back-reference to the underlying lvalue expression.
    pub expression: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct AssignmentData {
    pub lvalue: ElementId,
    pub rvalue: ElementId,
    /// Whether this assignment was desugared from `+=`/`-=`/`++`/`--`.
    pub is_augmented: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CastData {
    pub argument: ElementId,
    /// `true` for `as?`, `false` for `as`.
    pub is_failable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnData {
    /// The function this return jumps out of.
    pub target: ElementId,
    pub result: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopJumpData {
    /// The loop this break/continue targets.
    pub target: ElementId,
}

#[derive(Debug, Clone)]
pub struct BlockData {
    pub statements: Vec<ElementId>,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionData {
    pub symbol: SymbolId,
    pub body: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopData {
    pub condition: ElementId,
    pub body: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct DeclarationData {
    pub symbol: SymbolId,
    pub initializer: ElementId,
}

#[derive(Debug, Clone, Copy)]
pub struct ThrowData {
    pub exception: ElementId,
}

// =============================================================================
// Arena
// =============================================================================

/// Flat arena holding all elements of one resolved tree.
#[derive(Debug, Default)]
pub struct ElementArena {
    elements: Vec<Element>,
    info: Vec<ElementInfo>,
    accesses: Vec<QualifiedAccessData>,
    when_subjects: Vec<WhenSubjectData>,
    whens: Vec<WhenData>,
    branches: Vec<WhenBranchData>,
    smart_casts: Vec<SmartCastData>,
    safe_calls: Vec<SafeCallData>,
    checked_subjects: Vec<CheckedSubjectData>,
    check_not_nulls: Vec<CheckNotNullData>,
    assignment_refs: Vec<AssignmentValueRefData>,
    assignments: Vec<AssignmentData>,
    casts: Vec<CastData>,
    returns: Vec<ReturnData>,
    loop_jumps: Vec<LoopJumpData>,
    blocks: Vec<BlockData>,
    functions: Vec<FunctionData>,
    loops: Vec<LoopData>,
    declarations: Vec<DeclarationData>,
    throws: Vec<ThrowData>,
}

impl ElementArena {
    pub fn new() -> ElementArena {
        ElementArena::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    #[inline]
    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.get(id).map(|element| element.kind)
    }

    /// Parent of an element, or `NONE` for roots.
    pub fn parent(&self, id: ElementId) -> ElementId {
        self.info
            .get(id.0 as usize)
            .map_or(ElementId::NONE, |info| info.parent)
    }

    /// Iterate the element and then its ancestors, innermost first.
    pub fn parents_with_self(&self, id: ElementId) -> ParentIter<'_> {
        ParentIter { arena: self, next: id }
    }

    /// Resolved type of an expression, or `NONE` when untyped.
    pub fn ty(&self, id: ElementId) -> TypeId {
        self.info
            .get(id.0 as usize)
            .map_or(TypeId::NONE, |info| info.ty)
    }

    pub fn set_type(&mut self, id: ElementId, ty: TypeId) {
        if let Some(info) = self.info.get_mut(id.0 as usize) {
            info.ty = ty;
        }
    }

    fn push(&mut self, kind: ElementKind, data: u32, ty: TypeId) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element { kind, data });
        self.info.push(ElementInfo {
            parent: ElementId::NONE,
            ty,
        });
        id
    }

    fn set_parent(&mut self, child: ElementId, parent: ElementId) {
        if !child.is_none() {
            if let Some(info) = self.info.get_mut(child.0 as usize) {
                info.parent = parent;
            }
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn add_access(
        &mut self,
        callee: SymbolId,
        dispatch_receiver: ElementId,
        extension_receiver: ElementId,
        ty: TypeId,
    ) -> ElementId {
        self.add_access_impl(callee, dispatch_receiver, extension_receiver, false, ty)
    }

    /// A `this` reference resolving to the given receiver symbol.
    pub fn add_this_access(&mut self, callee: SymbolId, ty: TypeId) -> ElementId {
        self.add_access_impl(callee, ElementId::NONE, ElementId::NONE, true, ty)
    }

    fn add_access_impl(
        &mut self,
        callee: SymbolId,
        dispatch_receiver: ElementId,
        extension_receiver: ElementId,
        is_this: bool,
        ty: TypeId,
    ) -> ElementId {
        let data = self.accesses.len() as u32;
        self.accesses.push(QualifiedAccessData {
            callee,
            dispatch_receiver,
            extension_receiver,
            is_this,
        });
        let id = self.push(ElementKind::QualifiedAccess, data, ty);
        self.set_parent(dispatch_receiver, id);
        self.set_parent(extension_receiver, id);
        id
    }

    pub fn add_when_subject(&mut self, when_expr: ElementId, ty: TypeId) -> ElementId {
        let data = self.when_subjects.len() as u32;
        self.when_subjects.push(WhenSubjectData { when_expr });
        self.push(ElementKind::WhenSubject, data, ty)
    }

    pub fn add_when(
        &mut self,
        subject_variable: ElementId,
        subject: ElementId,
        branches: Vec<ElementId>,
        ty: TypeId,
    ) -> ElementId {
        let data = self.whens.len() as u32;
        self.whens.push(WhenData {
            subject_variable,
            subject,
            branches: branches.clone(),
        });
        let id = self.push(ElementKind::When, data, ty);
        self.set_parent(subject_variable, id);
        self.set_parent(subject, id);
        for branch in branches {
            self.set_parent(branch, id);
        }
        id
    }

    pub fn add_branch(&mut self, condition: ElementId, result: ElementId) -> ElementId {
        let data = self.branches.len() as u32;
        self.branches.push(WhenBranchData { condition, result });
        let id = self.push(ElementKind::WhenBranch, data, TypeId::NONE);
        self.set_parent(condition, id);
        self.set_parent(result, id);
        id
    }

    pub fn add_smart_cast(&mut self, original: ElementId, ty: TypeId) -> ElementId {
        let data = self.smart_casts.len() as u32;
        self.smart_casts.push(SmartCastData { original });
        let id = self.push(ElementKind::SmartCast, data, ty);
        self.set_parent(original, id);
        id
    }

    pub fn add_safe_call(
        &mut self,
        receiver: ElementId,
        selector: ElementId,
        ty: TypeId,
    ) -> ElementId {
        let data = self.safe_calls.len() as u32;
        self.safe_calls.push(SafeCallData { receiver, selector });
        let id = self.push(ElementKind::SafeCall, data, ty);
        self.set_parent(receiver, id);
        self.set_parent(selector, id);
        id
    }

    pub fn add_checked_subject(&mut self, original_receiver: ElementId, ty: TypeId) -> ElementId {
        let data = self.checked_subjects.len() as u32;
        self.checked_subjects
            .push(CheckedSubjectData { original_receiver });
        self.push(ElementKind::CheckedSafeCallSubject, data, ty)
    }

    pub fn add_check_not_null(&mut self, argument: ElementId, ty: TypeId) -> ElementId {
        let data = self.check_not_nulls.len() as u32;
        self.check_not_nulls.push(CheckNotNullData { argument });
        let id = self.push(ElementKind::CheckNotNull, data, ty);
        self.set_parent(argument, id);
        id
    }

    pub fn add_assignment_value_ref(&mut self, expression: ElementId, ty: TypeId) -> ElementId {
        let data = self.assignment_refs.len() as u32;
        self.assignment_refs
            .push(AssignmentValueRefData { expression });
        self.push(ElementKind::DesugaredAssignmentValueRef, data, ty)
    }

    pub fn add_assignment(
        &mut self,
        lvalue: ElementId,
        rvalue: ElementId,
        is_augmented: bool,
    ) -> ElementId {
        let data = self.assignments.len() as u32;
        self.assignments.push(AssignmentData {
            lvalue,
            rvalue,
            is_augmented,
        });
        let id = self.push(ElementKind::Assignment, data, TypeId::NONE);
        self.set_parent(lvalue, id);
        self.set_parent(rvalue, id);
        id
    }

    pub fn add_cast(&mut self, argument: ElementId, is_failable: bool, ty: TypeId) -> ElementId {
        let data = self.casts.len() as u32;
        self.casts.push(CastData {
            argument,
            is_failable,
        });
        let id = self.push(ElementKind::Cast, data, ty);
        self.set_parent(argument, id);
        id
    }

    pub fn add_return(&mut self, target: ElementId, result: ElementId) -> ElementId {
        let data = self.returns.len() as u32;
        self.returns.push(ReturnData { target, result });
        let id = self.push(ElementKind::Return, data, TypeId::NONE);
        self.set_parent(result, id);
        id
    }

    pub fn add_break(&mut self, target: ElementId) -> ElementId {
        let data = self.loop_jumps.len() as u32;
        self.loop_jumps.push(LoopJumpData { target });
        self.push(ElementKind::Break, data, TypeId::NONE)
    }

    pub fn add_continue(&mut self, target: ElementId) -> ElementId {
        let data = self.loop_jumps.len() as u32;
        self.loop_jumps.push(LoopJumpData { target });
        self.push(ElementKind::Continue, data, TypeId::NONE)
    }

    pub fn add_block(&mut self, statements: Vec<ElementId>, ty: TypeId) -> ElementId {
        let data = self.blocks.len() as u32;
        self.blocks.push(BlockData {
            statements: statements.clone(),
        });
        let id = self.push(ElementKind::Block, data, ty);
        for statement in statements {
            self.set_parent(statement, id);
        }
        id
    }

    pub fn add_function(&mut self, symbol: SymbolId, body: ElementId) -> ElementId {
        let data = self.functions.len() as u32;
        self.functions.push(FunctionData { symbol, body });
        let id = self.push(ElementKind::Function, data, TypeId::NONE);
        self.set_parent(body, id);
        id
    }

    pub fn add_anonymous_function(&mut self, symbol: SymbolId, body: ElementId) -> ElementId {
        let data = self.functions.len() as u32;
        self.functions.push(FunctionData { symbol, body });
        let id = self.push(ElementKind::AnonymousFunction, data, TypeId::NONE);
        self.set_parent(body, id);
        id
    }

    pub fn add_loop(&mut self, condition: ElementId, body: ElementId) -> ElementId {
        let data = self.loops.len() as u32;
        self.loops.push(LoopData { condition, body });
        let id = self.push(ElementKind::Loop, data, TypeId::NONE);
        self.set_parent(condition, id);
        self.set_parent(body, id);
        id
    }

    pub fn add_declaration(&mut self, symbol: SymbolId, initializer: ElementId) -> ElementId {
        let data = self.declarations.len() as u32;
        self.declarations.push(DeclarationData {
            symbol,
            initializer,
        });
        let id = self.push(ElementKind::Declaration, data, TypeId::NONE);
        self.set_parent(initializer, id);
        id
    }

    pub fn add_throw(&mut self, exception: ElementId) -> ElementId {
        let data = self.throws.len() as u32;
        self.throws.push(ThrowData { exception });
        let id = self.push(ElementKind::Throw, data, TypeId::NONE);
        self.set_parent(exception, id);
        id
    }

    pub fn add_literal(&mut self, ty: TypeId) -> ElementId {
        self.push(ElementKind::Literal, 0, ty)
    }

    pub fn add_error(&mut self) -> ElementId {
        self.push(ElementKind::Error, 0, TypeId::ERROR)
    }

    // =========================================================================
    // Back-reference patching
    //
    // Jump targets and subject links point at constructs that enclose the
    // element, so they cannot exist yet when the element is created. The
    // resolver fills them in afterwards.
    // =========================================================================

    pub fn set_return_target(&mut self, id: ElementId, target: ElementId) {
        let Some(&element) = self.get(id) else { return };
        if element.kind == ElementKind::Return {
            if let Some(payload) = self.returns.get_mut(element.data as usize) {
                payload.target = target;
            }
        }
    }

    pub fn set_loop_jump_target(&mut self, id: ElementId, target: ElementId) {
        let Some(&element) = self.get(id) else { return };
        if matches!(element.kind, ElementKind::Break | ElementKind::Continue) {
            if let Some(payload) = self.loop_jumps.get_mut(element.data as usize) {
                payload.target = target;
            }
        }
    }

    pub fn set_when_subject_ref(&mut self, id: ElementId, when_expr: ElementId) {
        let Some(&element) = self.get(id) else { return };
        if element.kind == ElementKind::WhenSubject {
            if let Some(payload) = self.when_subjects.get_mut(element.data as usize) {
                payload.when_expr = when_expr;
            }
        }
    }

    // =========================================================================
    // Payload access
    // =========================================================================

    pub fn get_access(&self, id: ElementId) -> Option<&QualifiedAccessData> {
        self.payload(id, ElementKind::QualifiedAccess, &self.accesses)
    }

    pub fn get_when_subject(&self, id: ElementId) -> Option<&WhenSubjectData> {
        self.payload(id, ElementKind::WhenSubject, &self.when_subjects)
    }

    pub fn get_when(&self, id: ElementId) -> Option<&WhenData> {
        self.payload(id, ElementKind::When, &self.whens)
    }

    pub fn get_branch(&self, id: ElementId) -> Option<&WhenBranchData> {
        self.payload(id, ElementKind::WhenBranch, &self.branches)
    }

    pub fn get_smart_cast(&self, id: ElementId) -> Option<&SmartCastData> {
        self.payload(id, ElementKind::SmartCast, &self.smart_casts)
    }

    pub fn get_safe_call(&self, id: ElementId) -> Option<&SafeCallData> {
        self.payload(id, ElementKind::SafeCall, &self.safe_calls)
    }

    pub fn get_checked_subject(&self, id: ElementId) -> Option<&CheckedSubjectData> {
        self.payload(id, ElementKind::CheckedSafeCallSubject, &self.checked_subjects)
    }

    pub fn get_check_not_null(&self, id: ElementId) -> Option<&CheckNotNullData> {
        self.payload(id, ElementKind::CheckNotNull, &self.check_not_nulls)
    }

    pub fn get_assignment_value_ref(&self, id: ElementId) -> Option<&AssignmentValueRefData> {
        self.payload(
            id,
            ElementKind::DesugaredAssignmentValueRef,
            &self.assignment_refs,
        )
    }

    pub fn get_assignment(&self, id: ElementId) -> Option<&AssignmentData> {
        self.payload(id, ElementKind::Assignment, &self.assignments)
    }

    pub fn get_cast(&self, id: ElementId) -> Option<&CastData> {
        self.payload(id, ElementKind::Cast, &self.casts)
    }

    pub fn get_return(&self, id: ElementId) -> Option<&ReturnData> {
        self.payload(id, ElementKind::Return, &self.returns)
    }

    /// Payload of a `Break` or `Continue` element.
    pub fn get_loop_jump(&self, id: ElementId) -> Option<&LoopJumpData> {
        let element = self.get(id)?;
        if !matches!(element.kind, ElementKind::Break | ElementKind::Continue) {
            return None;
        }
        self.loop_jumps.get(element.data as usize)
    }

    pub fn get_block(&self, id: ElementId) -> Option<&BlockData> {
        self.payload(id, ElementKind::Block, &self.blocks)
    }

    /// Payload of a `Function` or `AnonymousFunction` element.
    pub fn get_function(&self, id: ElementId) -> Option<&FunctionData> {
        let element = self.get(id)?;
        if !matches!(
            element.kind,
            ElementKind::Function | ElementKind::AnonymousFunction
        ) {
            return None;
        }
        self.functions.get(element.data as usize)
    }

    pub fn get_loop(&self, id: ElementId) -> Option<&LoopData> {
        self.payload(id, ElementKind::Loop, &self.loops)
    }

    pub fn get_declaration(&self, id: ElementId) -> Option<&DeclarationData> {
        self.payload(id, ElementKind::Declaration, &self.declarations)
    }

    pub fn get_throw(&self, id: ElementId) -> Option<&ThrowData> {
        self.payload(id, ElementKind::Throw, &self.throws)
    }

    fn payload<'a, T>(&'a self, id: ElementId, kind: ElementKind, pool: &'a [T]) -> Option<&'a T> {
        let element = self.get(id)?;
        if element.kind != kind {
            return None;
        }
        pool.get(element.data as usize)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Owned children of an element, in source order. Back-references (jump
    /// targets, when-subject links) are not children.
    pub fn children(&self, id: ElementId) -> SmallVec<[ElementId; 4]> {
        let mut out = SmallVec::new();
        let Some(element) = self.get(id) else {
            return out;
        };
        let mut push = |child: ElementId, out: &mut SmallVec<[ElementId; 4]>| {
            if !child.is_none() {
                out.push(child);
            }
        };
        match element.kind {
            ElementKind::QualifiedAccess => {
                let data = &self.accesses[element.data as usize];
                push(data.dispatch_receiver, &mut out);
                push(data.extension_receiver, &mut out);
            }
            ElementKind::When => {
                let data = &self.whens[element.data as usize];
                push(data.subject_variable, &mut out);
                push(data.subject, &mut out);
                for &branch in &data.branches {
                    push(branch, &mut out);
                }
            }
            ElementKind::WhenBranch => {
                let data = &self.branches[element.data as usize];
                push(data.condition, &mut out);
                push(data.result, &mut out);
            }
            ElementKind::SmartCast => {
                push(self.smart_casts[element.data as usize].original, &mut out);
            }
            ElementKind::SafeCall => {
                let data = &self.safe_calls[element.data as usize];
                push(data.receiver, &mut out);
                push(data.selector, &mut out);
            }
            ElementKind::CheckNotNull => {
                push(self.check_not_nulls[element.data as usize].argument, &mut out);
            }
            ElementKind::Assignment => {
                let data = &self.assignments[element.data as usize];
                push(data.lvalue, &mut out);
                push(data.rvalue, &mut out);
            }
            ElementKind::Cast => {
                push(self.casts[element.data as usize].argument, &mut out);
            }
            ElementKind::Return => {
                push(self.returns[element.data as usize].result, &mut out);
            }
            ElementKind::Block => {
                for &statement in &self.blocks[element.data as usize].statements {
                    push(statement, &mut out);
                }
            }
            ElementKind::Function | ElementKind::AnonymousFunction => {
                push(self.functions[element.data as usize].body, &mut out);
            }
            ElementKind::Loop => {
                let data = &self.loops[element.data as usize];
                push(data.condition, &mut out);
                push(data.body, &mut out);
            }
            ElementKind::Declaration => {
                push(self.declarations[element.data as usize].initializer, &mut out);
            }
            ElementKind::Throw => {
                push(self.throws[element.data as usize].exception, &mut out);
            }
            ElementKind::WhenSubject
            | ElementKind::CheckedSafeCallSubject
            | ElementKind::DesugaredAssignmentValueRef
            | ElementKind::Break
            | ElementKind::Continue
            | ElementKind::Literal
            | ElementKind::Error => {}
        }
        out
    }
}

/// Iterator over an element and its ancestors.
pub struct ParentIter<'a> {
    arena: &'a ElementArena,
    next: ElementId,
}

impl Iterator for ParentIter<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;
        self.next = self.arena.parent(current);
        Some(current)
    }
}
