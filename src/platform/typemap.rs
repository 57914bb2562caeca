//! Native type tables: logical type -> native type name for rendering, and
//! native type name -> logical type for reading metadata back.

use crate::models::types::{ColumnType, LogicalType, SizeKind};

/// Native spelling of one logical type.
#[derive(Debug, Clone, Copy)]
pub struct NativeType {
    pub logical: LogicalType,
    pub name: &'static str,
    /// Whether the native type accepts a `(size)` / `(precision,scale)` argument.
    pub takes_size: bool,
    /// Written after the size argument, e.g. `BYTE` in `CHAR(16) BYTE`.
    pub suffix: &'static str,
}

impl NativeType {
    pub const fn plain(logical: LogicalType, name: &'static str) -> Self {
        Self {
            logical,
            name,
            takes_size: false,
            suffix: "",
        }
    }

    pub const fn sized(logical: LogicalType, name: &'static str) -> Self {
        Self {
            logical,
            name,
            takes_size: true,
            suffix: "",
        }
    }

    pub const fn sized_with_suffix(
        logical: LogicalType,
        name: &'static str,
        suffix: &'static str,
    ) -> Self {
        Self {
            logical,
            name,
            takes_size: true,
            suffix,
        }
    }
}

/// A vendor version's map lists only what differs from its `parent`; every
/// lookup falls back to the parent.
#[derive(Debug)]
pub struct TypeMap {
    pub natives: &'static [NativeType],
    /// Extra spellings the database reports in its catalog.
    pub aliases: &'static [(&'static str, LogicalType)],
    pub parent: Option<&'static TypeMap>,
}

impl TypeMap {
    pub fn native(&self, logical: LogicalType) -> Option<&NativeType> {
        self.natives
            .iter()
            .find(|n| n.logical == logical)
            .or_else(|| self.parent.and_then(|parent| parent.native(logical)))
    }

    /// Maps a catalog type name to a logical type, ignoring case and surrounding blanks.
    pub fn logical_type(&self, native: &str) -> Option<LogicalType> {
        let native = native.trim();
        self.aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(native))
            .map(|(_, logical)| *logical)
            .or_else(|| {
                self.natives
                    .iter()
                    .find(|n| n.name.eq_ignore_ascii_case(native))
                    .map(|n| n.logical)
            })
            .or_else(|| self.parent.and_then(|parent| parent.logical_type(native)))
    }

    /// Renders the full native type, including size arguments where the native type takes them.
    pub fn render(&self, column_type: &ColumnType) -> String {
        let native = match self.native(column_type.logical) {
            Some(native) => *native,
            None => NativeType::sized(column_type.logical, column_type.logical.name()),
        };
        let mut rendered = native.name.to_string();
        if native.takes_size {
            match (column_type.logical.size_kind(), column_type.size) {
                (SizeKind::Length, Some(size)) => {
                    rendered.push_str(&format!("({})", size));
                }
                (SizeKind::PrecisionScale, Some(precision)) => {
                    rendered.push_str(&format!(
                        "({},{})",
                        precision,
                        column_type.scale.unwrap_or(0)
                    ));
                }
                _ => {}
            }
        }
        if !native.suffix.is_empty() {
            rendered.push(' ');
            rendered.push_str(native.suffix);
        }
        rendered
    }

    /// Two types are equivalent on a platform when they render to the same native type.
    pub fn equivalent(&self, a: &ColumnType, b: &ColumnType) -> bool {
        self.render(a).eq_ignore_ascii_case(&self.render(b))
    }
}

/// Splits a declared type such as `VARCHAR(100)`, `decimal(10, 2)` or
/// `int(10) unsigned` into its name and size arguments.
pub fn parse_type_declaration(declaration: &str) -> (String, Option<u32>, Option<u32>) {
    let declaration = declaration.trim();
    let Some(open) = declaration.find('(') else {
        return (declaration.to_string(), None, None);
    };
    let name = declaration[..open].trim().to_string();
    let close = declaration[open..]
        .find(')')
        .map(|i| open + i)
        .unwrap_or(declaration.len());
    let mut args = declaration[open + 1..close]
        .split(',')
        .map(|arg| arg.trim().parse::<u32>().ok());
    let size = args.next().flatten();
    let scale = args.next().flatten();
    (name, size, scale)
}
