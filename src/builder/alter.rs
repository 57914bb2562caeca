//! Alter-column styles a dialect picks from.

use crate::errors::DdlError;
use crate::models::schema::{Column, Table};
use crate::platform::dialect::AutoIncrement;

use super::SqlBuilder;

fn type_changed(builder: &SqlBuilder<'_>, from: &Column, to: &Column) -> bool {
    !builder
        .platform()
        .dialect()
        .type_map
        .equivalent(&from.column_type, &to.column_type)
}

fn default_changed(from: &Column, to: &Column) -> bool {
    from.default.as_deref().map(str::trim) != to.default.as_deref().map(str::trim)
}

/// One `ALTER TABLE .. ALTER COLUMN` statement per changed attribute.
pub fn alter_attributes(
    builder: &mut SqlBuilder<'_>,
    table: &Table,
    from: &Column,
    to: &Column,
) -> Result<(), DdlError> {
    let mut clauses = Vec::new();
    if type_changed(builder, from, to) {
        clauses.push(format!("TYPE {}", builder.native_type(to)));
    }
    if from.nullable != to.nullable {
        clauses.push(if to.nullable { "DROP NOT NULL" } else { "SET NOT NULL" }.to_string());
    }
    if default_changed(from, to) {
        clauses.push(match &to.default {
            Some(default) => format!("SET DEFAULT {}", default),
            None => "DROP DEFAULT".to_string(),
        });
    }
    if from.auto_increment != to.auto_increment {
        let keyword = match builder.platform().dialect().auto_increment {
            AutoIncrement::Inline(keyword) => keyword,
            _ => "GENERATED BY DEFAULT AS IDENTITY",
        };
        clauses.push(if to.auto_increment {
            format!("ADD {}", keyword)
        } else {
            "DROP IDENTITY".to_string()
        });
    }

    for clause in clauses {
        builder.print_alter_table(table);
        builder.print("ALTER COLUMN ");
        builder.print_identifier(&to.name);
        builder.print(" ");
        builder.print(&clause);
        builder.print_end_of_statement();
    }
    Ok(())
}

/// `ALTER TABLE .. MODIFY <full column definition>`
pub fn modify_column(
    builder: &mut SqlBuilder<'_>,
    table: &Table,
    _from: &Column,
    to: &Column,
) -> Result<(), DdlError> {
    let definition = builder.column_definition(table, to);
    builder.print_alter_table(table);
    builder.print("MODIFY ");
    builder.print(&definition);
    builder.print_end_of_statement();
    Ok(())
}

/// `ALTER TABLE .. MODIFY (<column> <type> [DEFAULT ..] [NULL | NOT NULL])`
///
/// Nullability is only written when it changes, since restating it is an error.
/// Auto-increment changes create or drop the column's sequence and trigger.
pub fn modify_parenthesized(
    builder: &mut SqlBuilder<'_>,
    table: &Table,
    from: &Column,
    to: &Column,
) -> Result<(), DdlError> {
    let mut definition = format!(
        "{} {}",
        builder.platform().quote_identifier(&to.name),
        builder.native_type(to)
    );
    if default_changed(from, to) {
        definition.push_str(" DEFAULT ");
        definition.push_str(to.default.as_deref().unwrap_or("NULL"));
    }
    if from.nullable != to.nullable {
        definition.push_str(if to.nullable { " NULL" } else { " NOT NULL" });
    }
    builder.print_alter_table(table);
    builder.print(&format!("MODIFY ({})", definition));
    builder.print_end_of_statement();

    if from.auto_increment != to.auto_increment {
        if to.auto_increment {
            builder.create_auto_increment_trigger(table, to);
        } else {
            builder.drop_auto_increment_trigger(table, from);
        }
    }
    Ok(())
}

pub fn unsupported(
    builder: &mut SqlBuilder<'_>,
    table: &Table,
    _from: &Column,
    to: &Column,
) -> Result<(), DdlError> {
    Err(builder.unsupported(&format!(
        "ALTER COLUMN {}.{}",
        table.name, to.name
    )))
}
