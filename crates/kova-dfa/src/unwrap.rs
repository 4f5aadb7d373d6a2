//! Runtime-value equivalence unwrapping.
//!
//! Several tree shapes wrap an expression without changing the value it
//! evaluates to: a smart cast is the original expression with a narrower
//! type, an assignment denotes its lvalue, a checked `as` cast either throws
//! or produces the operand unchanged. Analyses that track facts per value
//! must see through these wrappers, otherwise `x` and `x as T` would be two
//! unrelated subjects.
//!
//! A failable `as?` cast is *not* looked through: it may evaluate to null
//! where the operand does not, so the two sit in different equivalence
//! classes.

use kova_tree::{ElementArena, ElementId, ElementKind};

/// Canonical representative of `element`'s runtime-value equivalence class.
///
/// Total and pure; elements that are not wrappers are returned unchanged.
/// Each step descends to a strictly earlier-built element, so the loop
/// terminates on any tree built children-first.
pub fn unwrap_element(tree: &ElementArena, element: ElementId) -> ElementId {
    let mut current = element;
    loop {
        let Some(kind) = tree.kind(current) else {
            return current;
        };
        let next = match kind {
            ElementKind::WhenSubject => {
                let Some(subject) = tree.get_when_subject(current) else {
                    return current;
                };
                let Some(when) = tree.get_when(subject.when_expr) else {
                    return current;
                };
                if !when.subject_variable.is_none() {
                    when.subject_variable
                } else {
                    when.subject
                }
            }
            ElementKind::SmartCast => {
                let Some(data) = tree.get_smart_cast(current) else {
                    return current;
                };
                data.original
            }
            ElementKind::SafeCall => {
                let Some(data) = tree.get_safe_call(current) else {
                    return current;
                };
                data.selector
            }
            ElementKind::CheckedSafeCallSubject => {
                let Some(data) = tree.get_checked_subject(current) else {
                    return current;
                };
                data.original_receiver
            }
            ElementKind::CheckNotNull => {
                let Some(data) = tree.get_check_not_null(current) else {
                    return current;
                };
                data.argument
            }
            ElementKind::DesugaredAssignmentValueRef => {
                let Some(data) = tree.get_assignment_value_ref(current) else {
                    return current;
                };
                data.expression
            }
            ElementKind::Assignment => {
                let Some(data) = tree.get_assignment(current) else {
                    return current;
                };
                data.lvalue
            }
            ElementKind::Cast => {
                let Some(data) = tree.get_cast(current) else {
                    return current;
                };
                if data.is_failable {
                    return current;
                }
                data.argument
            }
            _ => return current,
        };
        if next.is_none() {
            return current;
        }
        current = next;
    }
}
