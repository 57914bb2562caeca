use std::fmt;

use crate::builder::{alter, naming, SqlBuilder};
use crate::db::RawColumn;
use crate::errors::DdlError;
use crate::models::schema::{Column, Table};

use super::typemap::TypeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    DoubleQuote,
    Backtick,
}

/// How auto-increment columns are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrement {
    /// Keyword written at the end of the column definition.
    Inline(&'static str),
    /// Keyword that also declares the primary key; only valid on a single-column key.
    IdentityPrimaryKey(&'static str),
    /// A sequence plus a before-insert trigger per column.
    SequenceTrigger,
}

/// Shape of `ALTER TABLE .. ADD` for a primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyAdd {
    /// `ADD CONSTRAINT <name> PRIMARY KEY (..)`
    Named,
    /// `ADD PRIMARY KEY (..)`
    Unnamed,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyDrop {
    /// `DROP CONSTRAINT <name>`
    Constraint,
    /// `DROP PRIMARY KEY`
    PrimaryKey,
    Unsupported,
}

/// Shape of `ALTER TABLE .. ADD` for a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAdd {
    /// `ADD CONSTRAINT <name> FOREIGN KEY (..)`
    Constraint,
    /// `ADD FOREIGN KEY <name> (..)`
    NamedForeignKey,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyDrop {
    /// `DROP CONSTRAINT <name>`
    Constraint,
    /// `DROP FOREIGN KEY <name>`
    ForeignKey,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDrop {
    /// `DROP INDEX <name>`
    Standalone,
    /// `DROP INDEX <name> ON <table>`
    OnTable,
    /// `ALTER TABLE <table> DROP INDEX <name>`
    AlterTable,
}

/// Capability record of one database dialect.
///
/// Every behavior a vendor may customize is a separate field, so a dialect
/// derived from another one (`Dialect { name: "oracle10", ..oracle9() }`)
/// replaces exactly the fields that differ and inherits the rest.
#[derive(Clone)]
pub struct Dialect {
    pub name: &'static str,
    pub quote: QuoteStyle,
    pub max_identifier_length: usize,
    pub statement_terminator: &'static str,
    pub type_map: &'static TypeMap,
    pub auto_increment: AutoIncrement,
    /// Primary key written inside `CREATE TABLE` rather than as a separate `ALTER TABLE`.
    pub primary_key_embedded: bool,
    /// Foreign keys written inside `CREATE TABLE`; the dialect cannot add them later.
    pub foreign_keys_embedded: bool,
    pub primary_key_add: PrimaryKeyAdd,
    pub primary_key_drop: PrimaryKeyDrop,
    pub foreign_key_add: ForeignKeyAdd,
    pub foreign_key_drop: ForeignKeyDrop,
    pub index_drop: IndexDrop,
    /// Keyword after `ALTER TABLE <t>` when adding a column.
    pub add_column: &'static str,
    pub drop_table_suffix: &'static str,
    /// Base name of a table's primary key constraint, before shortening and collision suffixes.
    pub primary_key_name: fn(&Table) -> String,
    /// Whether a primary key statement is written for these key columns at all.
    pub should_generate_primary_keys: fn(&[&Column]) -> bool,
    /// Tables the reader never returns, e.g. system catalogs.
    pub is_table_excluded: fn(&str) -> bool,
    /// Query with one bound table name; any row means the table sits in the recycle bin.
    pub recycle_bin_query: Option<&'static str>,
    /// Vendor quirks removed from catalog rows before type mapping.
    pub normalize_column: fn(RawColumn) -> RawColumn,
    pub alter_column: fn(&mut SqlBuilder<'_>, &Table, &Column, &Column) -> Result<(), DdlError>,
}

impl Dialect {
    /// Plain SQL-92 behavior every built-in dialect starts from.
    pub fn standard(type_map: &'static TypeMap) -> Self {
        Self {
            name: "standard",
            quote: QuoteStyle::DoubleQuote,
            max_identifier_length: 128,
            statement_terminator: ";",
            type_map,
            auto_increment: AutoIncrement::Inline("GENERATED BY DEFAULT AS IDENTITY"),
            primary_key_embedded: true,
            foreign_keys_embedded: false,
            primary_key_add: PrimaryKeyAdd::Named,
            primary_key_drop: PrimaryKeyDrop::Constraint,
            foreign_key_add: ForeignKeyAdd::Constraint,
            foreign_key_drop: ForeignKeyDrop::Constraint,
            index_drop: IndexDrop::Standalone,
            add_column: "ADD COLUMN",
            drop_table_suffix: "",
            primary_key_name: generated_primary_key_name,
            should_generate_primary_keys: always_generate_primary_keys,
            is_table_excluded: no_excluded_tables,
            recycle_bin_query: None,
            normalize_column: keep_column,
            alter_column: alter::alter_attributes,
        }
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("quote", &self.quote)
            .field("max_identifier_length", &self.max_identifier_length)
            .field("auto_increment", &self.auto_increment)
            .field("primary_key_embedded", &self.primary_key_embedded)
            .field("foreign_keys_embedded", &self.foreign_keys_embedded)
            .field("recycle_bin_query", &self.recycle_bin_query)
            .finish_non_exhaustive()
    }
}

pub fn generated_primary_key_name(table: &Table) -> String {
    naming::primary_key_base_name(table)
}

pub fn always_generate_primary_keys(_: &[&Column]) -> bool {
    true
}

pub fn no_excluded_tables(_: &str) -> bool {
    false
}

pub fn keep_column(raw: RawColumn) -> RawColumn {
    raw
}
