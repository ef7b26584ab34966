//! Type evaluation pass.

use crate::error::BundleError;
use crate::frontend::{Frontend, TypeTag};
use crate::ids::Binding;
use crate::unit::CompilationUnit;

use tessera_common::Interner;

/// Asks the front end for the type of every declaration, in unit order and
/// declaration order. Each declaration sees the types of the declarations it
/// references that were evaluated before it.
pub(crate) fn eval_types(
    units: &mut [CompilationUnit],
    frontend: &dyn Frontend,
    interner: &Interner,
) -> Result<(), BundleError> {
    for i in 0..units.len() {
        let (done, rest) = units.split_at_mut(i);
        let unit = &mut rest[0];
        let count = unit.module.declarations.len();
        unit.types = vec![None; count];

        for decl in 0..count {
            let inputs: Vec<Option<TypeTag>> = unit
                .references(decl)
                .iter()
                .map(|binding| match binding {
                    Binding::Decl(id) if id.unit == unit.id => unit.types[id.index as usize].clone(),
                    Binding::Decl(id) => done[id.unit.index()].decl_type(id.index as usize).cloned(),
                    Binding::Namespace(_) => None,
                })
                .collect();
            let tag = frontend
                .eval_type(&unit.module, decl, &inputs)
                .map_err(|message| BundleError::TypeError {
                    path: unit.path.clone(),
                    name: interner.resolve(unit.module.declarations[decl].name).to_string(),
                    message,
                })?;
            unit.types[decl] = Some(tag);
        }
    }
    Ok(())
}
