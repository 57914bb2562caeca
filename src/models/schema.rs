use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::DdlError;

use super::types::ColumnType;

/// How identifiers are compared. Most dialects fold case, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCase {
    #[default]
    Insensitive,
    Sensitive,
}

impl NameCase {
    pub fn eq(self, a: &str, b: &str) -> bool {
        match self {
            NameCase::Insensitive => a.eq_ignore_ascii_case(b),
            NameCase::Sensitive => a == b,
        }
    }

    /// Key under which a name is stored in lookup sets.
    pub fn key(self, name: &str) -> String {
        match self {
            NameCase::Insensitive => name.to_ascii_uppercase(),
            NameCase::Sensitive => name.to_string(),
        }
    }
}

/// Vendor-neutral schema: an ordered list of tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Key column names in key order. Documents that only flag their key
    /// columns leave this empty; the flags then give the key in column order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Raw SQL expression, written verbatim after `DEFAULT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub primary_key: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Explicit constraint name; builders generate one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub foreign_table: String,
    pub references: Vec<Reference>,
}

/// One `local column -> referenced column` pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub local: String,
    pub foreign: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl Database {
    /// Builds a database and validates it with case-insensitive name rules.
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Result<Self, DdlError> {
        let database = Self {
            name: name.into(),
            tables,
        };
        database.validate()?;
        Ok(database)
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), DdlError> {
        self.validate_with(NameCase::Insensitive)
    }

    pub fn validate_with(&self, case: NameCase) -> Result<(), DdlError> {
        let mut table_names = HashSet::new();
        for table in &self.tables {
            if table.name.is_empty() {
                return Err(DdlError::validation("table name cannot be empty"));
            }
            if !table_names.insert(case.key(&table.name)) {
                return Err(DdlError::validation(format!(
                    "duplicate table {}",
                    table.name
                )));
            }
            table.validate_local(case)?;
        }

        for table in &self.tables {
            for fk in &table.foreign_keys {
                let target = self.find_table_by(&fk.foreign_table, case).ok_or_else(|| {
                    DdlError::validation(format!(
                        "foreign key {} of table {} references unknown table {}",
                        fk.display_name(),
                        table.name,
                        fk.foreign_table
                    ))
                })?;
                for reference in &fk.references {
                    if target.find_column_by(&reference.foreign, case).is_none() {
                        return Err(DdlError::validation(format!(
                            "foreign key {} of table {} references unknown column {}.{}",
                            fk.display_name(),
                            table.name,
                            target.name,
                            reference.foreign
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.find_table_by(name, NameCase::Insensitive)
    }

    pub fn find_table_by(&self, name: &str, case: NameCase) -> Option<&Table> {
        self.tables.iter().find(|t| case.eq(&t.name, name))
    }

    pub(crate) fn find_table_mut(&mut self, name: &str, case: NameCase) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| case.eq(&t.name, name))
    }

    /// Resolves the referenced table and the `(local, referenced)` column pairs of `fk`.
    pub fn resolve_foreign_key<'a>(
        &'a self,
        table: &'a Table,
        fk: &ForeignKey,
    ) -> Option<(&'a Table, Vec<(&'a Column, &'a Column)>)> {
        let target = self.find_table(&fk.foreign_table)?;
        let pairs = fk
            .references
            .iter()
            .map(|r| Some((table.find_column(&r.local)?, target.find_column(&r.foreign)?)))
            .collect::<Option<Vec<_>>>()?;
        Some((target, pairs))
    }

    /// All foreign keys, in table order, that point at `table_name`.
    pub fn referencing_foreign_keys(
        &self,
        table_name: &str,
        case: NameCase,
    ) -> Vec<(&Table, &ForeignKey)> {
        self.tables
            .iter()
            .flat_map(|t| t.foreign_keys.iter().map(move |fk| (t, fk)))
            .filter(|(_, fk)| case.eq(&fk.foreign_table, table_name))
            .collect()
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds `column`; a column flagged as key column is appended to the primary key.
    pub fn with_column(mut self, column: Column) -> Self {
        if column.primary_key && !self.primary_key.contains(&column.name) {
            self.primary_key.push(column.name.clone());
        }
        self.columns.push(column);
        self
    }

    /// Replaces the primary key with `columns` in the given order and flags those columns.
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_primary_key(columns.into_iter().map(Into::into).collect(), NameCase::Insensitive);
        self
    }

    pub(crate) fn set_primary_key(&mut self, key: Vec<String>, case: NameCase) {
        for column in &mut self.columns {
            column.primary_key = key.iter().any(|k| case.eq(k, &column.name));
            if column.primary_key {
                column.nullable = false;
            }
        }
        self.primary_key = key;
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.find_column_by(name, NameCase::Insensitive)
    }

    pub fn find_column_by(&self, name: &str, case: NameCase) -> Option<&Column> {
        self.columns.iter().find(|c| case.eq(&c.name, name))
    }

    /// Primary key columns in key order.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key_names()
            .into_iter()
            .filter_map(|name| self.find_column(name))
            .collect()
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        if !self.primary_key.is_empty() {
            return self.primary_key.iter().map(String::as_str).collect();
        }
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty() || self.columns.iter().any(|c| c.primary_key)
    }

    pub fn auto_increment_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.auto_increment).collect()
    }

    fn validate_local(&self, case: NameCase) -> Result<(), DdlError> {
        let mut column_names = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(DdlError::validation(format!(
                    "table {} has a column without a name",
                    self.name
                )));
            }
            if !column_names.insert(case.key(&column.name)) {
                return Err(DdlError::validation(format!(
                    "duplicate column {}.{}",
                    self.name, column.name
                )));
            }
        }

        let mut key_names = HashSet::new();
        for key in &self.primary_key {
            let flagged = self
                .find_column_by(key, case)
                .map(|c| c.primary_key)
                .ok_or_else(|| {
                    DdlError::validation(format!(
                        "primary key of table {} uses unknown column {}",
                        self.name, key
                    ))
                })?;
            if !flagged || !key_names.insert(case.key(key)) {
                return Err(DdlError::validation(format!(
                    "primary key of table {} does not match its key columns",
                    self.name
                )));
            }
        }
        if !self.primary_key.is_empty()
            && self.columns.iter().filter(|c| c.primary_key).count() != key_names.len()
        {
            return Err(DdlError::validation(format!(
                "primary key of table {} does not match its key columns",
                self.name
            )));
        }

        let mut constraint_names = HashSet::new();
        for fk in &self.foreign_keys {
            if fk.references.is_empty() {
                return Err(DdlError::validation(format!(
                    "foreign key {} of table {} has no column references",
                    fk.display_name(),
                    self.name
                )));
            }
            for reference in &fk.references {
                if self.find_column_by(&reference.local, case).is_none() {
                    return Err(DdlError::validation(format!(
                        "foreign key {} uses unknown column {}.{}",
                        fk.display_name(),
                        self.name,
                        reference.local
                    )));
                }
            }
            if let Some(name) = &fk.name {
                if !constraint_names.insert(case.key(name)) {
                    return Err(DdlError::validation(format!(
                        "duplicate constraint name {} in table {}",
                        name, self.name
                    )));
                }
            }
        }

        let mut index_names = HashSet::new();
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(DdlError::validation(format!(
                    "index {} of table {} has no columns",
                    index.display_name(),
                    self.name
                )));
            }
            for column in &index.columns {
                if self.find_column_by(column, case).is_none() {
                    return Err(DdlError::validation(format!(
                        "index {} uses unknown column {}.{}",
                        index.display_name(),
                        self.name,
                        column
                    )));
                }
            }
            if let Some(name) = &index.name {
                if !index_names.insert(case.key(name)) {
                    return Err(DdlError::validation(format!(
                        "duplicate index name {} in table {}",
                        name, self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: true,
            default: None,
            auto_increment: false,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as part of the primary key; key columns are never nullable.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }
}

impl ForeignKey {
    pub fn new(foreign_table: impl Into<String>) -> Self {
        Self {
            name: None,
            foreign_table: foreign_table.into(),
            references: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn reference(mut self, local: impl Into<String>, foreign: impl Into<String>) -> Self {
        self.references.push(Reference {
            local: local.into(),
            foreign: foreign.into(),
        });
        self
    }

    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.local.as_str())
    }

    pub fn foreign_columns(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.foreign.as_str())
    }

    /// Explicit name, or the platform-independent generated base name.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let locals: Vec<&str> = self.local_columns().collect();
                format!("FK_{}_{}", locals.join("_"), self.foreign_table)
            }
        }
    }
}

impl Index {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("IDX_{}", self.columns.join("_")),
        }
    }
}
