//! Renders schema entities and change-sets into dialect-specific DDL.

pub mod alter;
pub mod naming;
pub mod sink;

use log::{debug, info};

use crate::diff::{order, ChangeOp, ChangeSet};
use crate::errors::DdlError;
use crate::models::schema::{Column, Database, ForeignKey, Index, Table};
use crate::platform::dialect::{
    AutoIncrement, Dialect, ForeignKeyAdd, ForeignKeyDrop, IndexDrop, PrimaryKeyAdd,
    PrimaryKeyDrop,
};
use crate::platform::Platform;

use self::naming::ConstraintNames;
use self::sink::SqlSink;

const INDENT: &str = "    ";

/// Writes DDL for one platform into a sink.
///
/// Every public operation writes complete statements, so operations can be
/// called in any order and any dialect hook can be swapped without touching
/// the others.
pub struct SqlBuilder<'a> {
    platform: &'a Platform,
    sink: &'a mut dyn SqlSink,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(platform: &'a Platform, sink: &'a mut dyn SqlSink) -> Self {
        Self { platform, sink }
    }

    pub fn platform(&self) -> &'a Platform {
        self.platform
    }

    fn dialect(&self) -> &'a Dialect {
        self.platform.dialect()
    }

    pub fn print(&mut self, text: &str) {
        self.sink.print(text);
    }

    pub fn println(&mut self, text: &str) {
        self.sink.print(text);
        self.sink.print("\n");
    }

    pub fn print_indent(&mut self) {
        self.sink.print(INDENT);
    }

    pub fn print_identifier(&mut self, name: &str) {
        let quoted = self.platform.quote_identifier(name);
        self.sink.print(&quoted);
    }

    pub fn println_identifier(&mut self, name: &str) {
        self.print_identifier(name);
        self.sink.print("\n");
    }

    pub fn print_end_of_statement(&mut self) {
        let terminator = self.dialect().statement_terminator;
        self.sink.end_statement(terminator);
    }

    /// Prints `ALTER TABLE <table> ` ready for the clause.
    pub fn print_alter_table(&mut self, table: &Table) {
        self.print("ALTER TABLE ");
        self.print_identifier(&table.name);
        self.print(" ");
    }

    pub fn constraint_name(
        &self,
        prefix: Option<&str>,
        table: &str,
        kind: &str,
        suffix: Option<&str>,
    ) -> String {
        naming::get_constraint_name(
            prefix,
            table,
            kind,
            suffix,
            self.platform.max_identifier_length(),
        )
    }

    /// Primary key, foreign key and index names of `table`, unique within it.
    pub fn constraint_names(&self, table: &Table) -> ConstraintNames {
        let base = (self.dialect().primary_key_name)(table);
        ConstraintNames::with_primary_key_base(table, &base, self.platform.max_identifier_length())
    }

    pub fn primary_key_name(&self, table: &Table) -> String {
        self.constraint_names(table).primary_key
    }

    pub fn foreign_key_name(&self, table: &Table, fk: &ForeignKey) -> String {
        self.constraint_names(table)
            .foreign_key(table, fk, self.platform.max_identifier_length())
    }

    pub fn index_name(&self, table: &Table, index: &Index) -> String {
        self.constraint_names(table)
            .index(table, index, self.platform.max_identifier_length())
    }

    pub fn native_type(&self, column: &Column) -> String {
        self.dialect().type_map.render(&column.column_type)
    }

    fn identifier_list<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> String {
        names
            .into_iter()
            .map(|name| self.platform.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `name TYPE [DEFAULT x] [NOT NULL] [auto-increment]`
    pub fn column_definition(&self, table: &Table, column: &Column) -> String {
        let mut definition = format!(
            "{} {}",
            self.platform.quote_identifier(&column.name),
            self.native_type(column)
        );
        if let Some(default) = &column.default {
            definition.push_str(" DEFAULT ");
            definition.push_str(default);
        }
        if !column.nullable {
            definition.push_str(" NOT NULL");
        }
        if column.auto_increment {
            match self.dialect().auto_increment {
                AutoIncrement::Inline(keyword) => {
                    definition.push(' ');
                    definition.push_str(keyword);
                }
                AutoIncrement::IdentityPrimaryKey(keyword) => {
                    let key = table.primary_key_names();
                    if key.len() == 1 && key[0] == column.name {
                        definition.push(' ');
                        definition.push_str(keyword);
                    }
                }
                AutoIncrement::SequenceTrigger => {}
            }
        }
        definition
    }

    fn writes_primary_key(&self, columns: &[&Column]) -> bool {
        !columns.is_empty() && (self.dialect().should_generate_primary_keys)(columns)
    }

    /// `(<locals>) REFERENCES <table> (<referenced>)`
    fn references_clause(&self, fk: &ForeignKey) -> String {
        format!(
            "({}) REFERENCES {} ({})",
            self.identifier_list(fk.local_columns()),
            self.platform.quote_identifier(&fk.foreign_table),
            self.identifier_list(fk.foreign_columns())
        )
    }

    /// Creates every table, then the foreign keys, so that no table references one not yet created.
    pub fn create_tables(&mut self, database: &Database) -> Result<(), DdlError> {
        info!(
            "Writing {} tables of {} for {}",
            database.tables.len(),
            database.name,
            self.platform.name()
        );
        if self.dialect().foreign_keys_embedded {
            let case = self.platform.name_case();
            for table in order::creation_order(database.tables.iter().collect(), case)? {
                self.create_table(table)?;
            }
            return Ok(());
        }
        for table in &database.tables {
            self.create_table(table)?;
        }
        for table in &database.tables {
            self.create_foreign_keys(table)?;
        }
        Ok(())
    }

    /// Drops every table, removing foreign keys first so that drop order does not matter.
    pub fn drop_tables(&mut self, database: &Database) -> Result<(), DdlError> {
        if self.dialect().foreign_keys_embedded {
            let case = self.platform.name_case();
            for table in order::drop_order(database.tables.iter().collect(), case)? {
                self.drop_table(table)?;
            }
            return Ok(());
        }
        for table in database.tables.iter().rev() {
            let names = self.constraint_names(table);
            for name in &names.foreign_keys {
                self.write_drop_foreign_key(table, name)?;
            }
        }
        for table in database.tables.iter().rev() {
            self.drop_table(table)?;
        }
        Ok(())
    }

    /// `CREATE TABLE` with the primary key (and foreign keys, where the dialect embeds them),
    /// followed by the auto-increment objects and indexes of the table.
    pub fn create_table(&mut self, table: &Table) -> Result<(), DdlError> {
        debug!("Creating table {}", table.name);
        let dialect = self.dialect();
        let names = self.constraint_names(table);
        let primary_key = table.primary_key_columns();
        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|column| self.column_definition(table, column))
            .collect();

        if dialect.primary_key_embedded && self.writes_primary_key(&primary_key) {
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                self.platform.quote_identifier(&names.primary_key),
                self.identifier_list(primary_key.iter().map(|c| c.name.as_str()))
            ));
        }
        if dialect.foreign_keys_embedded {
            for (fk, name) in table.foreign_keys.iter().zip(&names.foreign_keys) {
                lines.push(format!(
                    "CONSTRAINT {} FOREIGN KEY {}",
                    self.platform.quote_identifier(name),
                    self.references_clause(fk)
                ));
            }
        }

        self.print("CREATE TABLE ");
        self.println_identifier(&table.name);
        self.println("(");
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            self.print_indent();
            self.print(line);
            self.println(if i < last { "," } else { "" });
        }
        self.print(")");
        self.print_end_of_statement();

        if !dialect.primary_key_embedded {
            self.create_primary_key(table, &primary_key)?;
        }
        if dialect.auto_increment == AutoIncrement::SequenceTrigger {
            for column in table.auto_increment_columns() {
                self.create_auto_increment_trigger(table, column);
            }
        }
        for (index, name) in table.indexes.iter().zip(&names.indexes) {
            self.write_create_index(table, index, name);
        }
        Ok(())
    }

    pub fn drop_table(&mut self, table: &Table) -> Result<(), DdlError> {
        debug!("Dropping table {}", table.name);
        self.print("DROP TABLE ");
        self.print_identifier(&table.name);
        let suffix = self.dialect().drop_table_suffix;
        self.print(suffix);
        self.print_end_of_statement();
        if self.dialect().auto_increment == AutoIncrement::SequenceTrigger {
            for column in table.auto_increment_columns() {
                self.drop_auto_increment_sequence(table, column);
            }
        }
        Ok(())
    }

    /// Adds the primary key over `columns`.
    ///
    /// Writes nothing when `columns` is empty or the dialect decides these
    /// columns need no separate key, e.g. a single auto-increment column.
    pub fn create_primary_key(&mut self, table: &Table, columns: &[&Column]) -> Result<(), DdlError> {
        if !self.writes_primary_key(columns) {
            debug!("No primary key statement for table {}", table.name);
            return Ok(());
        }
        let names = self.identifier_list(columns.iter().map(|c| c.name.as_str()));
        match self.dialect().primary_key_add {
            PrimaryKeyAdd::Named => {
                let name = self.primary_key_name(table);
                self.print_alter_table(table);
                self.print("ADD CONSTRAINT ");
                self.print_identifier(&name);
                self.print(&format!(" PRIMARY KEY ({})", names));
            }
            PrimaryKeyAdd::Unnamed => {
                self.print_alter_table(table);
                self.print(&format!("ADD PRIMARY KEY ({})", names));
            }
            PrimaryKeyAdd::Unsupported => return Err(self.unsupported("ADD PRIMARY KEY")),
        }
        self.print_end_of_statement();
        Ok(())
    }

    pub fn drop_primary_key(&mut self, table: &Table) -> Result<(), DdlError> {
        match self.dialect().primary_key_drop {
            PrimaryKeyDrop::Constraint => {
                let name = self.primary_key_name(table);
                self.print_alter_table(table);
                self.print("DROP CONSTRAINT ");
                self.print_identifier(&name);
            }
            PrimaryKeyDrop::PrimaryKey => {
                self.print_alter_table(table);
                self.print("DROP PRIMARY KEY");
            }
            PrimaryKeyDrop::Unsupported => return Err(self.unsupported("DROP PRIMARY KEY")),
        }
        self.print_end_of_statement();
        Ok(())
    }

    pub fn create_foreign_keys(&mut self, table: &Table) -> Result<(), DdlError> {
        let names = self.constraint_names(table);
        for (fk, name) in table.foreign_keys.iter().zip(&names.foreign_keys) {
            self.write_create_foreign_key(table, fk, name)?;
        }
        Ok(())
    }

    pub fn create_foreign_key(&mut self, table: &Table, fk: &ForeignKey) -> Result<(), DdlError> {
        let name = self.foreign_key_name(table, fk);
        self.write_create_foreign_key(table, fk, &name)
    }

    fn write_create_foreign_key(
        &mut self,
        table: &Table,
        fk: &ForeignKey,
        name: &str,
    ) -> Result<(), DdlError> {
        if self.dialect().foreign_keys_embedded {
            return Err(self.unsupported("ADD FOREIGN KEY"));
        }
        let name = self.platform.quote_identifier(name);
        let clause = match self.dialect().foreign_key_add {
            ForeignKeyAdd::Constraint => format!(
                "ADD CONSTRAINT {} FOREIGN KEY {}",
                name,
                self.references_clause(fk)
            ),
            ForeignKeyAdd::NamedForeignKey => {
                format!("ADD FOREIGN KEY {} {}", name, self.references_clause(fk))
            }
            ForeignKeyAdd::Unsupported => return Err(self.unsupported("ADD FOREIGN KEY")),
        };
        debug!("Creating foreign key {} on {}", name, table.name);
        self.print_alter_table(table);
        self.print(&clause);
        self.print_end_of_statement();
        Ok(())
    }

    /// Drops `fk` under the same name [`SqlBuilder::create_foreign_key`] gave it.
    pub fn drop_foreign_key(&mut self, table: &Table, fk: &ForeignKey) -> Result<(), DdlError> {
        let name = self.foreign_key_name(table, fk);
        self.write_drop_foreign_key(table, &name)
    }

    fn write_drop_foreign_key(&mut self, table: &Table, name: &str) -> Result<(), DdlError> {
        if self.dialect().foreign_keys_embedded {
            return Err(self.unsupported("DROP FOREIGN KEY"));
        }
        debug!("Dropping foreign key {} on {}", name, table.name);
        match self.dialect().foreign_key_drop {
            ForeignKeyDrop::Constraint => {
                self.print_alter_table(table);
                self.print("DROP CONSTRAINT ");
            }
            ForeignKeyDrop::ForeignKey => {
                self.print_alter_table(table);
                self.print("DROP FOREIGN KEY ");
            }
            ForeignKeyDrop::Unsupported => return Err(self.unsupported("DROP FOREIGN KEY")),
        }
        self.print_identifier(name);
        self.print_end_of_statement();
        Ok(())
    }

    pub fn create_index(&mut self, table: &Table, index: &Index) -> Result<(), DdlError> {
        let name = self.index_name(table, index);
        self.write_create_index(table, index, &name);
        Ok(())
    }

    fn write_create_index(&mut self, table: &Table, index: &Index, name: &str) {
        let columns = self.identifier_list(index.columns.iter().map(String::as_str));
        self.print(if index.unique {
            "CREATE UNIQUE INDEX "
        } else {
            "CREATE INDEX "
        });
        self.print_identifier(name);
        self.print(" ON ");
        self.print_identifier(&table.name);
        self.print(&format!(" ({})", columns));
        self.print_end_of_statement();
    }

    pub fn drop_index(&mut self, table: &Table, index: &Index) -> Result<(), DdlError> {
        let name = self.index_name(table, index);
        match self.dialect().index_drop {
            IndexDrop::Standalone => {
                self.print("DROP INDEX ");
                self.print_identifier(&name);
            }
            IndexDrop::OnTable => {
                self.print("DROP INDEX ");
                self.print_identifier(&name);
                self.print(" ON ");
                self.print_identifier(&table.name);
            }
            IndexDrop::AlterTable => {
                self.print_alter_table(table);
                self.print("DROP INDEX ");
                self.print_identifier(&name);
            }
        }
        self.print_end_of_statement();
        Ok(())
    }

    pub fn add_column(&mut self, table: &Table, column: &Column) -> Result<(), DdlError> {
        let definition = self.column_definition(table, column);
        self.print_alter_table(table);
        let keyword = self.dialect().add_column;
        self.print(&format!("{} {}", keyword, definition));
        self.print_end_of_statement();
        if column.auto_increment && self.dialect().auto_increment == AutoIncrement::SequenceTrigger {
            self.create_auto_increment_trigger(table, column);
        }
        Ok(())
    }

    pub fn drop_column(&mut self, table: &Table, column: &Column) -> Result<(), DdlError> {
        self.print_alter_table(table);
        self.print("DROP COLUMN ");
        self.print_identifier(&column.name);
        self.print_end_of_statement();
        if column.auto_increment && self.dialect().auto_increment == AutoIncrement::SequenceTrigger {
            self.drop_auto_increment_sequence(table, column);
        }
        Ok(())
    }

    /// Changes `from` into `to` in the dialect's alter-column style.
    pub fn alter_column(&mut self, table: &Table, from: &Column, to: &Column) -> Result<(), DdlError> {
        debug!("Altering column {}.{}", table.name, to.name);
        let alter = self.dialect().alter_column;
        alter(self, table, from, to)
    }

    /// Sequence plus before-insert trigger that fills `column` on insert.
    pub fn create_auto_increment_trigger(&mut self, table: &Table, column: &Column) {
        let sequence = self.constraint_name(Some("SEQ"), &table.name, &column.name, None);
        let trigger = self.constraint_name(Some("TRG"), &table.name, &column.name, None);
        self.print("CREATE SEQUENCE ");
        self.print_identifier(&sequence);
        self.print_end_of_statement();

        self.print("CREATE OR REPLACE TRIGGER ");
        self.print_identifier(&trigger);
        self.print(" BEFORE INSERT ON ");
        self.print_identifier(&table.name);
        self.println(" FOR EACH ROW");
        self.println("BEGIN");
        self.print("SELECT ");
        self.print_identifier(&sequence);
        self.print(".nextval INTO :new.");
        self.print_identifier(&column.name);
        self.println(" FROM dual;");
        self.print("END");
        self.print_end_of_statement();
    }

    /// The trigger goes away with its table or column; the sequence does not.
    pub fn drop_auto_increment_sequence(&mut self, table: &Table, column: &Column) {
        let sequence = self.constraint_name(Some("SEQ"), &table.name, &column.name, None);
        self.print("DROP SEQUENCE ");
        self.print_identifier(&sequence);
        self.print_end_of_statement();
    }

    /// Drops the sequence and trigger of a column that stops being auto-increment.
    pub fn drop_auto_increment_trigger(&mut self, table: &Table, column: &Column) {
        let trigger = self.constraint_name(Some("TRG"), &table.name, &column.name, None);
        self.print("DROP TRIGGER ");
        self.print_identifier(&trigger);
        self.print_end_of_statement();
        self.drop_auto_increment_sequence(table, column);
    }

    /// Renders every operation of `changes` in order.
    pub fn process_changes(&mut self, changes: &ChangeSet) -> Result<(), DdlError> {
        info!(
            "Writing {} schema changes for {}",
            changes.len(),
            self.platform.name()
        );
        for op in changes.ops() {
            match op {
                ChangeOp::CreateTable { table } => self.create_table(table)?,
                ChangeOp::DropTable { table } => self.drop_table(table)?,
                ChangeOp::AddColumn { table, column } => self.add_column(table, column)?,
                ChangeOp::DropColumn { table, column } => self.drop_column(table, column)?,
                ChangeOp::AlterColumn { table, from, to } => self.alter_column(table, from, to)?,
                ChangeOp::AddPrimaryKey { table } => {
                    self.create_primary_key(table, &table.primary_key_columns())?
                }
                ChangeOp::DropPrimaryKey { table } => self.drop_primary_key(table)?,
                ChangeOp::AddForeignKey { table, foreign_key } => {
                    self.create_foreign_key(table, foreign_key)?
                }
                ChangeOp::DropForeignKey { table, foreign_key } => {
                    self.drop_foreign_key(table, foreign_key)?
                }
                ChangeOp::AddIndex { table, index } => self.create_index(table, index)?,
                ChangeOp::DropIndex { table, index } => self.drop_index(table, index)?,
            }
        }
        Ok(())
    }

    pub fn unsupported(&self, operation: &str) -> DdlError {
        DdlError::unsupported(self.platform.name(), operation)
    }
}

#[cfg(test)]
mod tests {
    use super::sink::Statements;
    use super::*;
    use crate::models::types::{ColumnType, LogicalType};
    use crate::platform::{builtins, PlatformConfig};

    fn platform(dialect: Dialect) -> Platform {
        Platform::new(dialect, PlatformConfig::default())
    }

    fn statements(platform: &Platform, f: impl FnOnce(&mut SqlBuilder<'_>) -> Result<(), DdlError>) -> Vec<String> {
        let mut sink = Statements::default();
        let mut builder = SqlBuilder::new(platform, &mut sink);
        f(&mut builder).unwrap();
        sink.into_vec()
    }

    fn users() -> Table {
        Table::new("USERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key().auto_increment())
            .with_column(Column::new("name", ColumnType::sized(LogicalType::VarChar, 100)).not_null())
            .with_column(Column::new("active", LogicalType::Boolean).with_default("true"))
            .with_index(Index::new(["name"]))
    }

    fn order_items() -> Table {
        Table::new("ORDER_ITEMS")
            .with_column(Column::new("order_id", LogicalType::Integer).primary_key())
            .with_column(Column::new("line", LogicalType::Integer).primary_key())
            .with_foreign_key(ForeignKey::new("ORDERS").reference("order_id", "id"))
    }

    #[test]
    fn test_create_table_postgres() {
        let pg = platform(builtins::postgresql());
        let sql = statements(&pg, |b| b.create_table(&users()));
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"USERS\"\n(\n    \"id\" INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY,\n    \"name\" VARCHAR(100) NOT NULL,\n    \"active\" BOOLEAN DEFAULT true,\n    CONSTRAINT \"USERS_pkey\" PRIMARY KEY (\"id\")\n)".to_string(),
                "CREATE INDEX \"USERS_IDX_name\" ON \"USERS\" (\"name\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_create_table_sqlite_inlines_autoincrement_key() {
        let sqlite = platform(builtins::sqlite());
        let sql = statements(&sqlite, |b| b.create_table(&users()));
        assert!(sql[0].contains("\"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT"));
        assert!(!sql[0].contains("CONSTRAINT"));
    }

    #[test]
    fn test_sapdb_adds_unnamed_primary_key_after_table() {
        let sapdb = platform(builtins::sapdb());
        let sql = statements(&sapdb, |b| b.create_table(&order_items()));
        assert_eq!(
            sql[1],
            "ALTER TABLE \"ORDER_ITEMS\" ADD PRIMARY KEY (\"order_id\", \"line\")"
        );

        let maxdb = platform(builtins::maxdb());
        let sql = statements(&maxdb, |b| b.create_table(&order_items()));
        assert_eq!(
            sql[1],
            "ALTER TABLE \"ORDER_ITEMS\" ADD CONSTRAINT \"ORDER_ITEMS_PK\" PRIMARY KEY (\"order_id\", \"line\")"
        );
    }

    #[test]
    fn test_create_primary_key_is_noop_without_columns() {
        for dialect in [builtins::postgresql(), builtins::sqlite(), builtins::sapdb()] {
            let platform = platform(dialect);
            let sql = statements(&platform, |b| b.create_primary_key(&Table::new("T"), &[]));
            assert!(sql.is_empty());
        }
    }

    #[test]
    fn test_create_primary_key_respects_dialect_policy() {
        let sqlite = platform(builtins::sqlite());
        let table = users();
        let sql = statements(&sqlite, |b| b.create_primary_key(&table, &table.primary_key_columns()));
        assert!(sql.is_empty());
    }

    #[test]
    fn test_foreign_key_drop_uses_created_name() {
        let pg = platform(builtins::postgresql());
        let table = order_items();
        let fk = &table.foreign_keys[0];
        let created = statements(&pg, |b| b.create_foreign_key(&table, fk));
        let dropped = statements(&pg, |b| b.drop_foreign_key(&table, fk));
        assert_eq!(
            created,
            vec!["ALTER TABLE \"ORDER_ITEMS\" ADD CONSTRAINT \"ORDER_ITEMS_FK_order_id_ORDERS\" FOREIGN KEY (\"order_id\") REFERENCES \"ORDERS\" (\"id\")"]
        );
        assert_eq!(
            dropped,
            vec!["ALTER TABLE \"ORDER_ITEMS\" DROP CONSTRAINT \"ORDER_ITEMS_FK_order_id_ORDERS\""]
        );
    }

    #[test]
    fn test_foreign_key_shapes_per_dialect() {
        let table = order_items();
        let fk = &table.foreign_keys[0];

        let mysql = platform(builtins::mysql());
        let dropped = statements(&mysql, |b| b.drop_foreign_key(&table, fk));
        assert_eq!(
            dropped,
            vec!["ALTER TABLE `ORDER_ITEMS` DROP FOREIGN KEY `ORDER_ITEMS_FK_order_id_ORDERS`"]
        );

        let sapdb = platform(builtins::sapdb());
        let created = statements(&sapdb, |b| b.create_foreign_key(&table, fk));
        assert_eq!(
            created,
            vec!["ALTER TABLE \"ORDER_ITEMS\" ADD FOREIGN KEY \"ORDER_ITEMS_FK_order_id_ORDERS\" (\"order_id\") REFERENCES \"ORDERS\" (\"id\")"]
        );

        let sqlite = platform(builtins::sqlite());
        let mut sink = Statements::default();
        let err = SqlBuilder::new(&sqlite, &mut sink)
            .drop_foreign_key(&table, fk)
            .unwrap_err();
        assert!(matches!(err, DdlError::Unsupported { .. }));
    }

    #[test]
    fn test_oracle_identifiers_fit_length_limit() {
        let oracle = platform(builtins::oracle10());
        let table = Table::new("CUSTOMER_ORDER_LINE_ITEMS")
            .with_column(Column::new("customer_order_id", LogicalType::Integer))
            .with_foreign_key(
                ForeignKey::new("CUSTOMER_ORDERS").reference("customer_order_id", "id"),
            );
        let name = SqlBuilder::new(&oracle, &mut Statements::default())
            .foreign_key_name(&table, &table.foreign_keys[0]);
        assert_eq!(name.chars().count(), 30);
    }

    #[test]
    fn test_oracle_sequence_trigger_and_purge() {
        let oracle = platform(builtins::oracle10());
        let table = users();
        let created = statements(&oracle, |b| b.create_table(&table));
        assert!(created[0].contains("\"id\" NUMBER(10) NOT NULL,"));
        assert_eq!(created[1], "CREATE SEQUENCE \"SEQ_USERS_id\"");
        assert!(created[2].starts_with("CREATE OR REPLACE TRIGGER \"TRG_USERS_id\" BEFORE INSERT ON \"USERS\""));

        let dropped = statements(&oracle, |b| b.drop_table(&table));
        assert_eq!(
            dropped,
            vec![
                "DROP TABLE \"USERS\" CASCADE CONSTRAINTS PURGE",
                "DROP SEQUENCE \"SEQ_USERS_id\"",
            ]
        );
    }

    #[test]
    fn test_index_drop_shapes() {
        let table = users();
        let index = &table.indexes[0];
        let expected = [
            (builtins::postgresql(), "DROP INDEX \"USERS_IDX_name\""),
            (builtins::sapdb(), "DROP INDEX \"USERS_IDX_name\" ON \"USERS\""),
            (builtins::mysql(), "ALTER TABLE `USERS` DROP INDEX `USERS_IDX_name`"),
        ];
        for (dialect, sql) in expected {
            let platform = platform(dialect);
            assert_eq!(statements(&platform, |b| b.drop_index(&table, index)), vec![sql]);
        }
    }

    #[test]
    fn test_create_tables_adds_foreign_keys_last() {
        let pg = platform(builtins::postgresql());
        let orders = Table::new("ORDERS").with_column(Column::new("id", LogicalType::Integer).primary_key());
        let db = Database::new("shop", vec![order_items(), orders]).unwrap();
        let sql = statements(&pg, |b| b.create_tables(&db));
        assert_eq!(sql.len(), 3);
        assert!(sql[0].starts_with("CREATE TABLE \"ORDER_ITEMS\""));
        assert!(sql[1].starts_with("CREATE TABLE \"ORDERS\""));
        assert!(sql[2].contains("FOREIGN KEY"));

        let sqlite = platform(builtins::sqlite());
        let sql = statements(&sqlite, |b| b.create_tables(&db));
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("CREATE TABLE \"ORDERS\""));
        assert!(sql[1].contains("CONSTRAINT \"ORDER_ITEMS_FK_order_id_ORDERS\" FOREIGN KEY (\"order_id\") REFERENCES \"ORDERS\" (\"id\")"));
    }

    #[test]
    fn test_primary_key_name_avoids_explicit_index_name() {
        let table = Table::new("USERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key())
            .with_index(Index::new(["id"]).named("USERS_PK").unique());

        let maxdb = platform(builtins::maxdb());
        let sql = statements(&maxdb, |b| b.create_table(&table));
        assert_eq!(
            sql[1..],
            [
                "ALTER TABLE \"USERS\" ADD CONSTRAINT \"USERS_PK_2\" PRIMARY KEY (\"id\")".to_string(),
                "CREATE UNIQUE INDEX \"USERS_PK\" ON \"USERS\" (\"id\")".to_string(),
            ]
        );

        let pg = platform(builtins::postgresql());
        let table = Table::new("USERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key())
            .with_index(Index::new(["id"]).named("USERS_pkey").unique());
        let created = statements(&pg, |b| b.create_table(&table));
        assert!(created[0].contains("CONSTRAINT \"USERS_pkey_2\" PRIMARY KEY"));
        assert_eq!(
            statements(&pg, |b| b.drop_primary_key(&table)),
            vec!["ALTER TABLE \"USERS\" DROP CONSTRAINT \"USERS_pkey_2\""]
        );
    }

    #[test]
    fn test_equal_unnamed_foreign_keys_and_indexes_get_distinct_names() {
        let orders = Table::new("ORDERS")
            .with_column(Column::new("id", LogicalType::Integer).primary_key());
        let items = Table::new("ITEMS")
            .with_column(Column::new("order_id", LogicalType::Integer))
            .with_foreign_key(ForeignKey::new("ORDERS").reference("order_id", "id"))
            .with_foreign_key(ForeignKey::new("ORDERS").reference("order_id", "id"))
            .with_index(Index::new(["order_id"]))
            .with_index(Index::new(["order_id"]));
        let db = Database::new("shop", vec![orders, items]).unwrap();

        let pg = platform(builtins::postgresql());
        let created = statements(&pg, |b| b.create_tables(&db));
        assert_eq!(
            created[2..],
            [
                "CREATE INDEX \"ITEMS_IDX_order_id\" ON \"ITEMS\" (\"order_id\")".to_string(),
                "CREATE INDEX \"ITEMS_IDX_order_id_2\" ON \"ITEMS\" (\"order_id\")".to_string(),
                "ALTER TABLE \"ITEMS\" ADD CONSTRAINT \"ITEMS_FK_order_id_ORDERS\" FOREIGN KEY (\"order_id\") REFERENCES \"ORDERS\" (\"id\")".to_string(),
                "ALTER TABLE \"ITEMS\" ADD CONSTRAINT \"ITEMS_FK_order_id_ORDERS_2\" FOREIGN KEY (\"order_id\") REFERENCES \"ORDERS\" (\"id\")".to_string(),
            ]
        );

        let dropped = statements(&pg, |b| b.drop_tables(&db));
        assert_eq!(
            dropped[..2],
            [
                "ALTER TABLE \"ITEMS\" DROP CONSTRAINT \"ITEMS_FK_order_id_ORDERS\"".to_string(),
                "ALTER TABLE \"ITEMS\" DROP CONSTRAINT \"ITEMS_FK_order_id_ORDERS_2\"".to_string(),
            ]
        );

        let sqlite = platform(builtins::sqlite());
        let created = statements(&sqlite, |b| b.create_tables(&db));
        assert!(created[1].contains("CONSTRAINT \"ITEMS_FK_order_id_ORDERS\" FOREIGN KEY"));
        assert!(created[1].contains("CONSTRAINT \"ITEMS_FK_order_id_ORDERS_2\" FOREIGN KEY"));
    }

    #[test]
    fn test_string_sink_script() {
        let pg = platform(builtins::postgresql());
        let mut sql = String::new();
        SqlBuilder::new(&pg, &mut sql)
            .drop_table(&Table::new("T"))
            .unwrap();
        assert_eq!(sql, "DROP TABLE \"T\";\n\n");
    }
}
