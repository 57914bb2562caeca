//! Deterministic names for constraints and indexes that were declared without one.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::schema::{ForeignKey, Index, Table};

/// Joins `prefix`, `table`, `kind` and `suffix` with `_` and fits the result into `max_length`.
///
/// Pure: identical inputs always produce the identical name.
pub fn get_constraint_name(
    prefix: Option<&str>,
    table: &str,
    kind: &str,
    suffix: Option<&str>,
    max_length: usize,
) -> String {
    let parts: Vec<&str> = prefix
        .into_iter()
        .chain([table, kind])
        .chain(suffix)
        .filter(|part| !part.is_empty())
        .collect();
    shorten_name(&parts.join("_"), max_length)
}

/// Returns `name` unchanged when it fits, otherwise a prefix of it plus `_` and
/// eight hex digits of its SHA-256, so that distinct long names stay distinct.
pub fn shorten_name(name: &str, max_length: usize) -> String {
    if name.chars().count() <= max_length {
        return name.to_string();
    }
    let digest = Sha256::digest(name.as_bytes());
    let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    if max_length <= hash.len() + 1 {
        return hash.chars().take(max_length).collect();
    }
    let keep = max_length - hash.len() - 1;
    let prefix: String = name.chars().take(keep).collect();
    format!("{}_{}", prefix, hash)
}

/// Names of every constraint and index of one table, by declaration position.
///
/// Explicit names are reserved first; the primary key and then the unnamed
/// foreign keys and indexes take the first free variant of their base name
/// (`base`, `base_2`, `base_3`, ...) in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintNames {
    pub primary_key: String,
    pub foreign_keys: Vec<String>,
    pub indexes: Vec<String>,
}

impl ConstraintNames {
    /// Names with the primary key based on `<table>_PK`.
    pub fn for_table(table: &Table, max_length: usize) -> Self {
        Self::with_primary_key_base(table, &primary_key_base_name(table), max_length)
    }

    pub fn with_primary_key_base(table: &Table, primary_key_base: &str, max_length: usize) -> Self {
        let mut taken: HashSet<String> = table
            .foreign_keys
            .iter()
            .filter_map(|fk| fk.name.as_deref())
            .chain(table.indexes.iter().filter_map(|i| i.name.as_deref()))
            .map(str::to_ascii_uppercase)
            .collect();

        let primary_key = reserve(&mut taken, primary_key_base, max_length);
        let foreign_keys = table
            .foreign_keys
            .iter()
            .map(|fk| match &fk.name {
                Some(name) => name.clone(),
                None => reserve(&mut taken, &foreign_key_base_name(table, fk), max_length),
            })
            .collect();
        let indexes = table
            .indexes
            .iter()
            .map(|index| match &index.name {
                Some(name) => name.clone(),
                None => reserve(&mut taken, &index_base_name(table, index), max_length),
            })
            .collect();

        Self {
            primary_key,
            foreign_keys,
            indexes,
        }
    }

    /// Name of `fk` when only its value is known. Equal unnamed keys resolve
    /// to the first one; callers walking the table use `foreign_keys` by position.
    pub fn foreign_key(&self, table: &Table, fk: &ForeignKey, max_length: usize) -> String {
        if let Some(name) = &fk.name {
            return name.clone();
        }
        table
            .foreign_keys
            .iter()
            .position(|candidate| candidate == fk)
            .and_then(|position| self.foreign_keys.get(position).cloned())
            .unwrap_or_else(|| shorten_name(&foreign_key_base_name(table, fk), max_length))
    }

    pub fn index(&self, table: &Table, index: &Index, max_length: usize) -> String {
        if let Some(name) = &index.name {
            return name.clone();
        }
        table
            .indexes
            .iter()
            .position(|candidate| candidate == index)
            .and_then(|position| self.indexes.get(position).cloned())
            .unwrap_or_else(|| shorten_name(&index_base_name(table, index), max_length))
    }
}

/// Name under which `fk` of `table` is created and dropped.
pub fn foreign_key_name(table: &Table, fk: &ForeignKey, max_length: usize) -> String {
    ConstraintNames::for_table(table, max_length).foreign_key(table, fk, max_length)
}

/// Name under which `index` of `table` is created and dropped.
pub fn index_name(table: &Table, index: &Index, max_length: usize) -> String {
    ConstraintNames::for_table(table, max_length).index(table, index, max_length)
}

pub fn primary_key_base_name(table: &Table) -> String {
    get_constraint_name(None, &table.name, "PK", None, usize::MAX)
}

fn foreign_key_base_name(table: &Table, fk: &ForeignKey) -> String {
    let locals: Vec<&str> = fk.local_columns().collect();
    let suffix = format!("{}_{}", locals.join("_"), fk.foreign_table);
    get_constraint_name(None, &table.name, "FK", Some(&suffix), usize::MAX)
}

fn index_base_name(table: &Table, index: &Index) -> String {
    let kind = if index.unique { "UIDX" } else { "IDX" };
    get_constraint_name(
        None,
        &table.name,
        kind,
        Some(&index.columns.join("_")),
        usize::MAX,
    )
}

fn reserve(taken: &mut HashSet<String>, base: &str, max_length: usize) -> String {
    let mut candidate = shorten_name(base, max_length);
    let mut counter = 2;
    while !taken.insert(candidate.to_ascii_uppercase()) {
        candidate = shorten_name(&format!("{}_{}", base, counter), max_length);
        counter += 1;
    }
    candidate
}
