//! Liveness analysis.
//!
//! Units are visited in reverse bundle order, so every consumer of a unit has
//! reported which of its declarations it uses before the unit itself is
//! analyzed. Within a unit, liveness spreads from the roots along
//! declaration references; references into other units are recorded as
//! requests for when those units are reached.

use crate::ids::{Binding, UnitId};
use crate::module::Linkage;
use crate::unit::{namespace_of, CompilationUnit};

/// Marks live declarations and used namespace objects.
///
/// Roots are top-level effects, universal declarations, and everything the
/// entry units export (including aggregate re-exports).
pub(crate) fn resolve_activity(units: &mut [CompilationUnit]) {
    let mut live: Vec<Vec<bool>> = units
        .iter()
        .map(|u| vec![false; u.module.declarations.len()])
        .collect();
    let mut namespace_used = vec![false; units.len()];

    {
        let units: &[CompilationUnit] = units;
        let mut stack: Vec<Binding> = Vec::new();
        for unit in units.iter().filter(|u| u.is_entry) {
            stack.extend(namespace_of(units, unit.id).values().copied());
        }
        mark(units, &mut stack, &mut live, &mut namespace_used, None);

        for unit in units.iter().rev() {
            let i = unit.id.index();
            for (d, decl) in unit.module.declarations.iter().enumerate() {
                if live[i][d] {
                    stack.extend(unit.references(d).iter().copied());
                } else if decl.linkage == Linkage::Universal {
                    stack.push(Binding::Decl(crate::ids::DeclId::new(unit.id, d)));
                }
            }
            stack.extend(unit.effect_refs.iter().copied());
            mark(units, &mut stack, &mut live, &mut namespace_used, Some(unit.id));
        }
    }

    for (unit, (live, used)) in units.iter_mut().zip(live.into_iter().zip(namespace_used)) {
        unit.live = live;
        unit.namespace_used = used;
    }
}

/// Drains `stack`, marking every binding live. References of newly live
/// declarations of `current` are followed immediately; other units follow
/// theirs when they are analyzed.
fn mark(
    units: &[CompilationUnit],
    stack: &mut Vec<Binding>,
    live: &mut [Vec<bool>],
    namespace_used: &mut [bool],
    current: Option<UnitId>,
) {
    while let Some(binding) = stack.pop() {
        match binding {
            Binding::Decl(id) => {
                let slot = &mut live[id.unit.index()][id.index as usize];
                if *slot {
                    continue;
                }
                *slot = true;
                if Some(id.unit) == current {
                    stack.extend(units[id.unit.index()].references(id.index as usize).iter().copied());
                }
                debug_assert!(
                    current.map_or(true, |c| id.unit <= c),
                    "provider analyzed before its consumer"
                );
            }
            Binding::Namespace(unit) => {
                if namespace_used[unit.index()] {
                    continue;
                }
                namespace_used[unit.index()] = true;
                stack.extend(namespace_of(units, unit).values().copied());
            }
        }
    }
}
