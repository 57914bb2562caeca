//! Computes the ordered change-set that turns one schema model into another.

pub mod order;

use std::collections::HashSet;
use std::fmt;

use log::{debug, info};

use crate::builder::naming;
use crate::errors::DdlError;
use crate::models::schema::{Column, Database, ForeignKey, Index, NameCase, Table};
use crate::platform::{Platform, TypeMap};

/// One schema change. Every operation carries a snapshot of the table it applies to:
/// the current table for drops, the desired table for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOp {
    CreateTable { table: Table },
    DropTable { table: Table },
    AddColumn { table: Table, column: Column },
    DropColumn { table: Table, column: Column },
    AlterColumn { table: Table, from: Column, to: Column },
    AddPrimaryKey { table: Table },
    DropPrimaryKey { table: Table },
    AddForeignKey { table: Table, foreign_key: ForeignKey },
    DropForeignKey { table: Table, foreign_key: ForeignKey },
    AddIndex { table: Table, index: Index },
    DropIndex { table: Table, index: Index },
}

impl ChangeOp {
    pub fn table(&self) -> &Table {
        match self {
            ChangeOp::CreateTable { table }
            | ChangeOp::DropTable { table }
            | ChangeOp::AddColumn { table, .. }
            | ChangeOp::DropColumn { table, .. }
            | ChangeOp::AlterColumn { table, .. }
            | ChangeOp::AddPrimaryKey { table }
            | ChangeOp::DropPrimaryKey { table }
            | ChangeOp::AddForeignKey { table, .. }
            | ChangeOp::DropForeignKey { table, .. }
            | ChangeOp::AddIndex { table, .. }
            | ChangeOp::DropIndex { table, .. } => table,
        }
    }
}

impl ChangeOp {
    /// `Kind(TABLE.member)`, naming unnamed keys and indexes as a builder limited
    /// to `max_name_length` characters would.
    pub fn describe(&self, max_name_length: usize) -> String {
        match self {
            ChangeOp::CreateTable { table } => format!("CreateTable({})", table.name),
            ChangeOp::DropTable { table } => format!("DropTable({})", table.name),
            ChangeOp::AddColumn { table, column } => {
                format!("AddColumn({}.{})", table.name, column.name)
            }
            ChangeOp::DropColumn { table, column } => {
                format!("DropColumn({}.{})", table.name, column.name)
            }
            ChangeOp::AlterColumn { table, to, .. } => {
                format!("AlterColumn({}.{})", table.name, to.name)
            }
            ChangeOp::AddPrimaryKey { table } => format!("AddPrimaryKey({})", table.name),
            ChangeOp::DropPrimaryKey { table } => format!("DropPrimaryKey({})", table.name),
            ChangeOp::AddForeignKey { table, foreign_key } => format!(
                "AddForeignKey({}.{})",
                table.name,
                naming::foreign_key_name(table, foreign_key, max_name_length)
            ),
            ChangeOp::DropForeignKey { table, foreign_key } => format!(
                "DropForeignKey({}.{})",
                table.name,
                naming::foreign_key_name(table, foreign_key, max_name_length)
            ),
            ChangeOp::AddIndex { table, index } => format!(
                "AddIndex({}.{})",
                table.name,
                naming::index_name(table, index, max_name_length)
            ),
            ChangeOp::DropIndex { table, index } => format!(
                "DropIndex({}.{})",
                table.name,
                naming::index_name(table, index, max_name_length)
            ),
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(usize::MAX))
    }
}

/// Ordered schema changes, produced by [`DiffEngine::diff`]. Never mutates its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    ops: Vec<ChangeOp>,
    /// `CreateTable` already declares the table's foreign keys.
    foreign_keys_embedded: bool,
    case: NameCase,
    max_name_length: usize,
}

impl ChangeSet {
    pub fn ops(&self) -> &[ChangeOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<ChangeOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// One line per operation, e.g. `AddColumn(USERS.email)`.
    pub fn summary(&self) -> Vec<String> {
        self.ops
            .iter()
            .map(|op| op.describe(self.max_name_length))
            .collect()
    }

    /// Applies the operations to a copy of `current`.
    pub fn apply(&self, current: &Database) -> Result<Database, DdlError> {
        let case = self.case;
        let mut database = current.clone();
        for op in &self.ops {
            match op {
                ChangeOp::CreateTable { table } => {
                    let mut created = table.clone();
                    if !self.foreign_keys_embedded {
                        created.foreign_keys.clear();
                    }
                    database.tables.push(created);
                }
                ChangeOp::DropTable { table } => {
                    let before = database.tables.len();
                    database.tables.retain(|t| !case.eq(&t.name, &table.name));
                    if database.tables.len() == before {
                        return Err(missing_table(op));
                    }
                }
                ChangeOp::AddColumn { table, column } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    let mut added = column.clone();
                    added.primary_key = false;
                    target.columns.push(added);
                }
                ChangeOp::DropColumn { table, column } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    target.columns.retain(|c| !case.eq(&c.name, &column.name));
                    target.primary_key.retain(|k| !case.eq(k, &column.name));
                }
                ChangeOp::AlterColumn { table, from, to } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    let column = target
                        .columns
                        .iter_mut()
                        .find(|c| case.eq(&c.name, &from.name))
                        .ok_or_else(|| missing_table(op))?;
                    let primary_key = column.primary_key;
                    *column = to.clone();
                    column.primary_key = primary_key;
                }
                ChangeOp::AddPrimaryKey { table } => {
                    let key = table
                        .primary_key_names()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    target.set_primary_key(key, case);
                }
                ChangeOp::DropPrimaryKey { table } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    target.set_primary_key(Vec::new(), case);
                }
                ChangeOp::AddForeignKey { table, foreign_key } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    target.foreign_keys.push(foreign_key.clone());
                }
                ChangeOp::DropForeignKey { table, foreign_key } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    if let Some(position) = target.foreign_keys.iter().position(|fk| fk == foreign_key) {
                        target.foreign_keys.remove(position);
                    }
                }
                ChangeOp::AddIndex { table, index } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    target.indexes.push(index.clone());
                }
                ChangeOp::DropIndex { table, index } => {
                    let target = table_mut(&mut database, op, &table.name, case)?;
                    if let Some(position) = target.indexes.iter().position(|i| i == index) {
                        target.indexes.remove(position);
                    }
                }
            }
        }
        database.name = current.name.clone();
        database.validate_with(case)?;
        Ok(database)
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            writeln!(f, "{}", op.describe(self.max_name_length))?;
        }
        Ok(())
    }
}

fn table_mut<'d>(
    database: &'d mut Database,
    op: &ChangeOp,
    name: &str,
    case: NameCase,
) -> Result<&'d mut Table, DdlError> {
    database
        .find_table_mut(name, case)
        .ok_or_else(|| missing_table(op))
}

fn missing_table(op: &ChangeOp) -> DdlError {
    DdlError::validation(format!("cannot apply {}: target does not exist", op))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    pub case: NameCase,
    /// Foreign keys are created with their table and dropped with it.
    pub foreign_keys_embedded: bool,
    /// Compares column types by native spelling instead of logical type.
    pub type_map: Option<&'static TypeMap>,
    /// Identifier limit used when the summary names unnamed keys and indexes.
    pub max_identifier_length: Option<usize>,
}

impl DiffOptions {
    pub fn for_platform(platform: &Platform) -> Self {
        Self {
            case: platform.name_case(),
            foreign_keys_embedded: platform.dialect().foreign_keys_embedded,
            type_map: Some(platform.dialect().type_map),
            max_identifier_length: Some(platform.max_identifier_length()),
        }
    }
}

/// Column, key and index changes of a table present in both models.
struct TableChanges<'m> {
    current: &'m Table,
    desired: &'m Table,
    dropped_columns: Vec<&'m Column>,
    altered_columns: Vec<(&'m Column, &'m Column)>,
    added_columns: Vec<&'m Column>,
    primary_key_changed: bool,
    dropped_foreign_keys: Vec<&'m ForeignKey>,
    added_foreign_keys: Vec<&'m ForeignKey>,
    dropped_indexes: Vec<&'m Index>,
    added_indexes: Vec<&'m Index>,
}

impl TableChanges<'_> {
    /// Whether a foreign key using `columns` of this table must be recreated.
    fn touches<'n>(&self, mut columns: impl Iterator<Item = &'n str>, case: NameCase) -> bool {
        columns.any(|name| {
            self.dropped_columns.iter().any(|c| case.eq(&c.name, name))
                || self.altered_columns.iter().any(|(c, _)| case.eq(&c.name, name))
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Ordered operations that turn `current` into `desired`.
    ///
    /// Emission order: foreign key drops, index drops, primary key drops,
    /// table drops, table creations, then per retained table its column drops,
    /// alterations and additions, then primary key, index and foreign key
    /// additions. Retained and created tables follow the desired model's
    /// order, dropped tables the current model's order.
    pub fn diff(&self, current: &Database, desired: &Database) -> Result<ChangeSet, DdlError> {
        let case = self.options.case;
        current.validate_with(case)?;
        desired.validate_with(case)?;

        let dropped: Vec<&Table> = current
            .tables
            .iter()
            .filter(|t| desired.find_table_by(&t.name, case).is_none())
            .collect();
        let created: Vec<&Table> = desired
            .tables
            .iter()
            .filter(|t| current.find_table_by(&t.name, case).is_none())
            .collect();
        let mut retained: Vec<TableChanges<'_>> = desired
            .tables
            .iter()
            .filter_map(|d| {
                current
                    .find_table_by(&d.name, case)
                    .map(|c| self.table_changes(c, d))
            })
            .collect();
        self.recreate_dependent_foreign_keys(&mut retained);

        let embedded = self.options.foreign_keys_embedded;
        let mut ops = Vec::new();

        for changes in &retained {
            for fk in &changes.dropped_foreign_keys {
                ops.push(ChangeOp::DropForeignKey {
                    table: changes.current.clone(),
                    foreign_key: (*fk).clone(),
                });
            }
        }
        if !embedded {
            for table in &dropped {
                for fk in &table.foreign_keys {
                    ops.push(ChangeOp::DropForeignKey {
                        table: (*table).clone(),
                        foreign_key: fk.clone(),
                    });
                }
            }
        }
        for changes in &retained {
            for index in &changes.dropped_indexes {
                ops.push(ChangeOp::DropIndex {
                    table: changes.current.clone(),
                    index: (*index).clone(),
                });
            }
        }
        for changes in &retained {
            if changes.primary_key_changed && changes.current.has_primary_key() {
                ops.push(ChangeOp::DropPrimaryKey {
                    table: changes.current.clone(),
                });
            }
        }

        let dropped = if embedded {
            order::drop_order(dropped, case)?
        } else {
            dropped
        };
        for table in dropped {
            ops.push(ChangeOp::DropTable {
                table: table.clone(),
            });
        }
        let created = if embedded {
            order::creation_order(created, case)?
        } else {
            created
        };
        for table in &created {
            ops.push(ChangeOp::CreateTable {
                table: (*table).clone(),
            });
        }

        for changes in &retained {
            for column in &changes.dropped_columns {
                ops.push(ChangeOp::DropColumn {
                    table: changes.current.clone(),
                    column: (*column).clone(),
                });
            }
            for (from, to) in &changes.altered_columns {
                ops.push(ChangeOp::AlterColumn {
                    table: changes.desired.clone(),
                    from: (*from).clone(),
                    to: (*to).clone(),
                });
            }
            for column in &changes.added_columns {
                ops.push(ChangeOp::AddColumn {
                    table: changes.desired.clone(),
                    column: (*column).clone(),
                });
            }
        }
        for changes in &retained {
            if changes.primary_key_changed && changes.desired.has_primary_key() {
                ops.push(ChangeOp::AddPrimaryKey {
                    table: changes.desired.clone(),
                });
            }
        }
        for changes in &retained {
            for index in &changes.added_indexes {
                ops.push(ChangeOp::AddIndex {
                    table: changes.desired.clone(),
                    index: (*index).clone(),
                });
            }
        }
        for table in &desired.tables {
            if let Some(changes) = retained.iter().find(|c| std::ptr::eq(c.desired, table)) {
                for fk in &changes.added_foreign_keys {
                    ops.push(ChangeOp::AddForeignKey {
                        table: table.clone(),
                        foreign_key: (*fk).clone(),
                    });
                }
            } else if !embedded {
                for fk in &table.foreign_keys {
                    ops.push(ChangeOp::AddForeignKey {
                        table: table.clone(),
                        foreign_key: fk.clone(),
                    });
                }
            }
        }

        info!(
            "Computed {} schema changes from {} to {}",
            ops.len(),
            current.name,
            desired.name
        );
        Ok(ChangeSet {
            ops,
            foreign_keys_embedded: embedded,
            case,
            max_name_length: self.options.max_identifier_length.unwrap_or(usize::MAX),
        })
    }

    fn table_changes<'m>(&self, current: &'m Table, desired: &'m Table) -> TableChanges<'m> {
        let case = self.options.case;
        let dropped_columns = current
            .columns
            .iter()
            .filter(|c| desired.find_column_by(&c.name, case).is_none())
            .collect();
        let added_columns = desired
            .columns
            .iter()
            .filter(|c| current.find_column_by(&c.name, case).is_none())
            .collect();
        let altered_columns = desired
            .columns
            .iter()
            .filter_map(|d| current.find_column_by(&d.name, case).map(|c| (c, d)))
            .filter(|(c, d)| self.column_changed(c, d))
            .collect();

        let current_key = current.primary_key_names();
        let desired_key = desired.primary_key_names();
        let primary_key_changed = current_key.len() != desired_key.len()
            || current_key
                .iter()
                .zip(&desired_key)
                .any(|(c, d)| !case.eq(c, d));

        let (dropped_foreign_keys, added_foreign_keys) =
            unmatched(&current.foreign_keys, &desired.foreign_keys, |c, d| {
                same_foreign_key(c, d, case)
            });
        let (dropped_indexes, added_indexes) =
            unmatched(&current.indexes, &desired.indexes, |c, d| same_index(c, d, case));

        let changes = TableChanges {
            current,
            desired,
            dropped_columns,
            altered_columns,
            added_columns,
            primary_key_changed,
            dropped_foreign_keys,
            added_foreign_keys,
            dropped_indexes,
            added_indexes,
        };
        debug!(
            "Table {}: {} dropped, {} altered, {} added columns",
            desired.name,
            changes.dropped_columns.len(),
            changes.altered_columns.len(),
            changes.added_columns.len()
        );
        changes
    }

    /// Foreign keys that survive unchanged still have to be dropped and re-added
    /// when a column they use changes, or when the key they reference changes.
    fn recreate_dependent_foreign_keys(&self, retained: &mut [TableChanges<'_>]) {
        let case = self.options.case;
        let mut recreate: Vec<(usize, &ForeignKey, &ForeignKey)> = Vec::new();
        for (i, changes) in retained.iter().enumerate() {
            let mut used = vec![false; changes.desired.foreign_keys.len()];
            for fk in &changes.current.foreign_keys {
                if changes.dropped_foreign_keys.iter().any(|d| std::ptr::eq(*d, fk)) {
                    continue;
                }
                let desired_keys = &changes.desired.foreign_keys;
                let Some(j) = (0..desired_keys.len())
                    .find(|&j| !used[j] && same_foreign_key(fk, &desired_keys[j], case))
                else {
                    continue;
                };
                used[j] = true;

                let local_changed = changes.touches(fk.local_columns(), case);
                let target_changed = retained
                    .iter()
                    .find(|t| case.eq(&t.current.name, &fk.foreign_table))
                    .map(|target| {
                        target.primary_key_changed
                            || target.touches(fk.foreign_columns(), case)
                    })
                    .unwrap_or(false);
                if local_changed || target_changed {
                    recreate.push((i, fk, &desired_keys[j]));
                }
            }
        }

        for (i, from, to) in recreate {
            debug!(
                "Recreating foreign key {} of table {}",
                from.display_name(),
                retained[i].current.name
            );
            retained[i].dropped_foreign_keys.push(from);
            let desired = retained[i].desired;
            let mut added: Vec<&ForeignKey> = retained[i].added_foreign_keys.clone();
            added.push(to);
            added.sort_by_key(|fk| {
                desired
                    .foreign_keys
                    .iter()
                    .position(|d| std::ptr::eq(d, *fk))
                    .unwrap_or(usize::MAX)
            });
            retained[i].added_foreign_keys = added;
        }
    }

    fn column_changed(&self, current: &Column, desired: &Column) -> bool {
        let type_changed = match self.options.type_map {
            Some(map) => !map.equivalent(&current.column_type, &desired.column_type),
            None => current.column_type.normalized() != desired.column_type.normalized(),
        };
        type_changed
            || current.nullable != desired.nullable
            || current.auto_increment != desired.auto_increment
            || current.default.as_deref().map(str::trim) != desired.default.as_deref().map(str::trim)
    }
}

/// Diffs with default options: case-insensitive names, logical type comparison,
/// foreign keys as separate statements.
pub fn diff(current: &Database, desired: &Database) -> Result<ChangeSet, DdlError> {
    DiffEngine::default().diff(current, desired)
}

/// Pairs items greedily in declaration order; returns the unpaired current and desired items.
fn unmatched<'m, T>(
    current: &'m [T],
    desired: &'m [T],
    same: impl Fn(&T, &T) -> bool,
) -> (Vec<&'m T>, Vec<&'m T>) {
    let mut used: HashSet<usize> = HashSet::new();
    let mut dropped = Vec::new();
    for item in current {
        match (0..desired.len()).find(|j| !used.contains(j) && same(item, &desired[*j])) {
            Some(j) => {
                used.insert(j);
            }
            None => dropped.push(item),
        }
    }
    let added = desired
        .iter()
        .enumerate()
        .filter(|(j, _)| !used.contains(j))
        .map(|(_, item)| item)
        .collect();
    (dropped, added)
}

fn same_name(a: &Option<String>, b: &Option<String>, case: NameCase) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => case.eq(a, b),
        _ => true,
    }
}

fn same_foreign_key(a: &ForeignKey, b: &ForeignKey, case: NameCase) -> bool {
    case.eq(&a.foreign_table, &b.foreign_table)
        && a.references.len() == b.references.len()
        && a
            .references
            .iter()
            .zip(&b.references)
            .all(|(x, y)| case.eq(&x.local, &y.local) && case.eq(&x.foreign, &y.foreign))
        && same_name(&a.name, &b.name, case)
}

fn same_index(a: &Index, b: &Index, case: NameCase) -> bool {
    a.unique == b.unique
        && a.columns.len() == b.columns.len()
        && a.columns.iter().zip(&b.columns).all(|(x, y)| case.eq(x, y))
        && same_name(&a.name, &b.name, case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{ColumnType, LogicalType};
    use crate::platform::{builtins, PlatformConfig};

    fn customers() -> Table {
        Table::new("CUSTOMERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key())
            .with_column(Column::new("name", ColumnType::sized(LogicalType::VarChar, 50)))
    }

    fn invoices() -> Table {
        Table::new("INVOICES")
            .with_column(Column::new("id", LogicalType::Integer).primary_key())
            .with_column(Column::new("customer_id", LogicalType::Integer))
            .with_foreign_key(ForeignKey::new("CUSTOMERS").reference("customer_id", "id"))
    }

    fn db(tables: Vec<Table>) -> Database {
        Database::new("test", tables).unwrap()
    }

    #[test]
    fn test_diff_of_identical_models_is_empty() {
        let model = db(vec![customers(), invoices()]);
        assert!(diff(&model, &model).unwrap().is_empty());
        assert!(diff(&Database::empty("a"), &Database::empty("b")).unwrap().is_empty());
    }

    #[test]
    fn test_created_table_foreign_keys_come_last() {
        let current = db(vec![]);
        let desired = db(vec![invoices(), customers()]);
        let changes = diff(&current, &desired).unwrap();
        assert_eq!(
            changes.summary(),
            vec![
                "CreateTable(INVOICES)",
                "CreateTable(CUSTOMERS)",
                "AddForeignKey(INVOICES.INVOICES_FK_customer_id_CUSTOMERS)",
            ]
        );
    }

    #[test]
    fn test_embedded_foreign_keys_order_created_tables() {
        let engine = DiffEngine::new(DiffOptions {
            foreign_keys_embedded: true,
            ..DiffOptions::default()
        });
        let changes = engine
            .diff(&db(vec![]), &db(vec![invoices(), customers()]))
            .unwrap();
        assert_eq!(
            changes.summary(),
            vec!["CreateTable(CUSTOMERS)", "CreateTable(INVOICES)"]
        );

        let dropped = engine
            .diff(&db(vec![customers(), invoices()]), &db(vec![]))
            .unwrap();
        assert_eq!(
            dropped.summary(),
            vec!["DropTable(INVOICES)", "DropTable(CUSTOMERS)"]
        );
    }

    #[test]
    fn test_altering_referenced_key_recreates_foreign_key() {
        let current = db(vec![customers(), invoices()]);
        let mut wider = customers();
        wider.columns[0].column_type = ColumnType::new(LogicalType::BigInt);
        let mut invoices = invoices();
        invoices.columns[1].column_type = ColumnType::new(LogicalType::BigInt);
        let desired = db(vec![wider, invoices]);

        let changes = diff(&current, &desired).unwrap();
        assert_eq!(
            changes.summary(),
            vec![
                "DropForeignKey(INVOICES.INVOICES_FK_customer_id_CUSTOMERS)",
                "AlterColumn(CUSTOMERS.id)",
                "AlterColumn(INVOICES.customer_id)",
                "AddForeignKey(INVOICES.INVOICES_FK_customer_id_CUSTOMERS)",
            ]
        );
        assert!(diff(&changes.apply(&current).unwrap(), &desired)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_primary_key_change() {
        let current = db(vec![customers()]);
        let desired = db(vec![Table::new("CUSTOMERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key())
            .with_column(
                Column::new("name", ColumnType::sized(LogicalType::VarChar, 50)).primary_key(),
            )]);
        let changes = diff(&current, &desired).unwrap();
        assert_eq!(
            changes.summary(),
            vec![
                "DropPrimaryKey(CUSTOMERS)",
                "AlterColumn(CUSTOMERS.name)",
                "AddPrimaryKey(CUSTOMERS)",
            ]
        );
        let applied = changes.apply(&current).unwrap();
        assert_eq!(applied.tables[0].primary_key_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_primary_key_order_change() {
        let keyed = |key: [&str; 2]| {
            db(vec![Table::new("T")
                .with_column(Column::new("a", LogicalType::Integer))
                .with_column(Column::new("b", LogicalType::Integer))
                .with_primary_key(key)])
        };
        let current = keyed(["a", "b"]);
        let desired = keyed(["b", "a"]);
        let changes = diff(&current, &desired).unwrap();
        assert_eq!(
            changes.summary(),
            vec!["DropPrimaryKey(T)", "AddPrimaryKey(T)"]
        );
        let applied = changes.apply(&current).unwrap();
        assert_eq!(applied.tables[0].primary_key_names(), vec!["b", "a"]);
        assert!(diff(&applied, &desired).unwrap().is_empty());

        let pg = Platform::new(builtins::postgresql(), PlatformConfig::default());
        assert_eq!(
            pg.migration_statements(&current, &desired).unwrap(),
            vec![
                "ALTER TABLE \"T\" DROP CONSTRAINT \"T_pkey\"",
                "ALTER TABLE \"T\" ADD CONSTRAINT \"T_pkey\" PRIMARY KEY (\"b\", \"a\")",
            ]
        );
    }

    #[test]
    fn test_summary_names_match_emitted_names() {
        let oracle = Platform::new(builtins::oracle10(), PlatformConfig::default());
        let orders = Table::new("CUSTOMER_ORDERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key());
        let items = Table::new("CUSTOMER_ORDER_LINE_ITEMS")
            .with_column(Column::new("customer_order_id", LogicalType::Integer));
        let current = db(vec![orders.clone(), items.clone()]);
        let desired = db(vec![
            orders,
            items.with_foreign_key(
                ForeignKey::new("CUSTOMER_ORDERS").reference("customer_order_id", "id"),
            ),
        ]);

        let summary = oracle.diff(&current, &desired).unwrap().summary();
        assert_eq!(summary.len(), 1);
        let name = summary[0]
            .trim_start_matches("AddForeignKey(CUSTOMER_ORDER_LINE_ITEMS.")
            .trim_end_matches(')');
        assert_eq!(name.chars().count(), 30);

        let statements = oracle.migration_statements(&current, &desired).unwrap();
        assert!(statements[0].contains(&format!("ADD CONSTRAINT \"{}\" FOREIGN KEY", name)));
    }

    #[test]
    fn test_platform_type_map_hides_equivalent_types() {
        let pg = Platform::new(builtins::postgresql(), PlatformConfig::default());
        let current = db(vec![Table::new("T")
            .with_column(Column::new("payload", ColumnType::sized(LogicalType::VarBinary, 16)))]);
        let desired = db(vec![
            Table::new("T").with_column(Column::new("payload", LogicalType::Blob))
        ]);
        assert!(pg.diff(&current, &desired).unwrap().is_empty());
        assert_eq!(diff(&current, &desired).unwrap().len(), 1);
    }

    #[test]
    fn test_unnamed_and_named_indexes_match_by_columns() {
        let current = db(vec![customers().with_index(Index::new(["name"]).named("CUSTOMERS_IDX_name"))]);
        let desired = db(vec![customers().with_index(Index::new(["name"]))]);
        assert!(diff(&current, &desired).unwrap().is_empty());

        let unique = db(vec![customers().with_index(Index::new(["name"]).unique())]);
        assert_eq!(
            diff(&current, &unique).unwrap().summary(),
            vec![
                "DropIndex(CUSTOMERS.CUSTOMERS_IDX_name)",
                "AddIndex(CUSTOMERS.CUSTOMERS_UIDX_name)",
            ]
        );
    }

    #[test]
    fn test_apply_rejects_missing_tables() {
        let changes = diff(&db(vec![customers()]), &db(vec![])).unwrap();
        assert!(changes.apply(&db(vec![])).is_err());
    }
}
