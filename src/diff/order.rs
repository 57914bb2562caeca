//! Foreign key dependency order between tables, for dialects that declare
//! foreign keys inside `CREATE TABLE`.

use crate::errors::DdlError;
use crate::models::schema::{NameCase, Table};

/// Orders `tables` so that every table comes after the tables it references.
///
/// References to tables outside `tables` and self-references are ignored.
/// Among tables whose dependencies are met, the earliest in `tables` goes first.
pub fn creation_order<'t>(tables: Vec<&'t Table>, case: NameCase) -> Result<Vec<&'t Table>, DdlError> {
    let dependencies: Vec<Vec<usize>> = tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            let mut deps: Vec<usize> = table
                .foreign_keys
                .iter()
                .filter_map(|fk| {
                    tables
                        .iter()
                        .position(|candidate| case.eq(&candidate.name, &fk.foreign_table))
                })
                .filter(|&j| j != i)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect();

    let mut placed = vec![false; tables.len()];
    let mut ordered = Vec::with_capacity(tables.len());
    while ordered.len() < tables.len() {
        let next = (0..tables.len())
            .find(|&i| !placed[i] && dependencies[i].iter().all(|&j| placed[j]));
        match next {
            Some(i) => {
                placed[i] = true;
                ordered.push(tables[i]);
            }
            None => {
                let cycle: Vec<&str> = (0..tables.len())
                    .filter(|&i| !placed[i])
                    .map(|i| tables[i].name.as_str())
                    .collect();
                return Err(DdlError::DependencyOrder(format!(
                    "foreign keys form a cycle between tables {}",
                    cycle.join(", ")
                )));
            }
        }
    }
    Ok(ordered)
}

/// Orders `tables` so that every table comes before the tables it references.
pub fn drop_order<'t>(tables: Vec<&'t Table>, case: NameCase) -> Result<Vec<&'t Table>, DdlError> {
    let mut ordered = creation_order(tables, case)?;
    ordered.reverse();
    Ok(ordered)
}
