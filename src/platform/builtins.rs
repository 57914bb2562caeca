//! Built-in dialects. Vendor versions extend their predecessor with struct update syntax.

use crate::builder::alter;
use crate::db::RawColumn;
use crate::models::schema::{Column, Table};
use crate::models::types::LogicalType::{self, *};

use super::dialect::{
    AutoIncrement, Dialect, ForeignKeyAdd, ForeignKeyDrop, IndexDrop, PrimaryKeyAdd,
    PrimaryKeyDrop, QuoteStyle,
};
use super::typemap::{NativeType, TypeMap};

const fn plain(logical: LogicalType, name: &'static str) -> NativeType {
    NativeType::plain(logical, name)
}

const fn sized(logical: LogicalType, name: &'static str) -> NativeType {
    NativeType::sized(logical, name)
}

pub static POSTGRESQL_TYPES: TypeMap = TypeMap {
    natives: &[
        plain(Bit, "BOOLEAN"),
        plain(Boolean, "BOOLEAN"),
        plain(TinyInt, "SMALLINT"),
        plain(SmallInt, "SMALLINT"),
        plain(Integer, "INTEGER"),
        plain(BigInt, "BIGINT"),
        plain(Real, "REAL"),
        plain(Float, "DOUBLE PRECISION"),
        plain(Double, "DOUBLE PRECISION"),
        sized(Decimal, "NUMERIC"),
        sized(Numeric, "NUMERIC"),
        sized(Char, "CHAR"),
        sized(VarChar, "VARCHAR"),
        plain(LongVarChar, "TEXT"),
        plain(Clob, "TEXT"),
        plain(Binary, "BYTEA"),
        plain(VarBinary, "BYTEA"),
        plain(LongVarBinary, "BYTEA"),
        plain(Blob, "BYTEA"),
        plain(Date, "DATE"),
        plain(Time, "TIME"),
        plain(Timestamp, "TIMESTAMP"),
    ],
    aliases: &[
        ("boolean", Boolean),
        ("bool", Boolean),
        ("smallint", SmallInt),
        ("int2", SmallInt),
        ("int4", Integer),
        ("int", Integer),
        ("int8", BigInt),
        ("float4", Real),
        ("float8", Double),
        ("double precision", Double),
        ("decimal", Decimal),
        ("character", Char),
        ("bpchar", Char),
        ("character varying", VarChar),
        ("text", LongVarChar),
        ("bytea", LongVarBinary),
        ("time without time zone", Time),
        ("timestamp without time zone", Timestamp),
    ],
    parent: None,
};

pub static MYSQL_TYPES: TypeMap = TypeMap {
    natives: &[
        plain(Bit, "TINYINT(1)"),
        plain(Boolean, "TINYINT(1)"),
        plain(TinyInt, "TINYINT"),
        plain(SmallInt, "SMALLINT"),
        plain(Integer, "INTEGER"),
        plain(BigInt, "BIGINT"),
        plain(Real, "FLOAT"),
        plain(Float, "DOUBLE"),
        plain(Double, "DOUBLE"),
        sized(Decimal, "DECIMAL"),
        sized(Numeric, "DECIMAL"),
        sized(Char, "CHAR"),
        sized(VarChar, "VARCHAR"),
        plain(LongVarChar, "MEDIUMTEXT"),
        plain(Clob, "LONGTEXT"),
        sized(Binary, "BINARY"),
        sized(VarBinary, "VARBINARY"),
        plain(LongVarBinary, "MEDIUMBLOB"),
        plain(Blob, "LONGBLOB"),
        plain(Date, "DATE"),
        plain(Time, "TIME"),
        plain(Timestamp, "DATETIME"),
    ],
    aliases: &[
        ("bit", Bit),
        ("boolean", Boolean),
        ("bool", Boolean),
        ("int", Integer),
        ("mediumint", Integer),
        ("numeric", Decimal),
        ("tinytext", VarChar),
        ("text", LongVarChar),
        ("tinyblob", VarBinary),
        ("blob", LongVarBinary),
        ("timestamp", Timestamp),
    ],
    parent: None,
};

pub static SQLITE_TYPES: TypeMap = TypeMap {
    natives: &[
        plain(Bit, "BOOLEAN"),
        plain(Boolean, "BOOLEAN"),
        plain(TinyInt, "SMALLINT"),
        plain(SmallInt, "SMALLINT"),
        plain(Integer, "INTEGER"),
        plain(BigInt, "BIGINT"),
        plain(Real, "REAL"),
        plain(Float, "DOUBLE"),
        plain(Double, "DOUBLE"),
        sized(Decimal, "DECIMAL"),
        sized(Numeric, "NUMERIC"),
        sized(Char, "CHAR"),
        sized(VarChar, "VARCHAR"),
        plain(LongVarChar, "TEXT"),
        plain(Clob, "TEXT"),
        sized(Binary, "BINARY"),
        sized(VarBinary, "VARBINARY"),
        plain(LongVarBinary, "BLOB"),
        plain(Blob, "BLOB"),
        plain(Date, "DATE"),
        plain(Time, "TIME"),
        plain(Timestamp, "TIMESTAMP"),
    ],
    aliases: &[
        ("boolean", Boolean),
        ("smallint", SmallInt),
        ("int", Integer),
        ("double", Double),
        ("datetime", Timestamp),
        ("varchar2", VarChar),
        ("clob", Clob),
    ],
    parent: None,
};

pub static ORACLE8_TYPES: TypeMap = TypeMap {
    natives: &[
        plain(Bit, "NUMBER(1)"),
        plain(Boolean, "NUMBER(1)"),
        plain(TinyInt, "NUMBER(3)"),
        plain(SmallInt, "NUMBER(5)"),
        plain(Integer, "NUMBER(10)"),
        plain(BigInt, "NUMBER(19)"),
        plain(Real, "REAL"),
        plain(Float, "FLOAT"),
        plain(Double, "DOUBLE PRECISION"),
        sized(Decimal, "NUMBER"),
        sized(Numeric, "NUMBER"),
        sized(Char, "CHAR"),
        sized(VarChar, "VARCHAR2"),
        plain(LongVarChar, "CLOB"),
        plain(Clob, "CLOB"),
        sized(Binary, "RAW"),
        sized(VarBinary, "RAW"),
        plain(LongVarBinary, "BLOB"),
        plain(Blob, "BLOB"),
        plain(Date, "DATE"),
        plain(Time, "DATE"),
        plain(Timestamp, "DATE"),
    ],
    aliases: &[
        ("number", Decimal),
        ("nvarchar2", VarChar),
        ("varchar", VarChar),
        ("nchar", Char),
        ("nclob", Clob),
        ("long", LongVarChar),
        ("long raw", LongVarBinary),
        ("binary_float", Real),
        ("binary_double", Double),
    ],
    parent: None,
};

/// Oracle 9 adds a real `TIMESTAMP`.
pub static ORACLE9_TYPES: TypeMap = TypeMap {
    natives: &[plain(Timestamp, "TIMESTAMP")],
    aliases: &[("timestamp(6)", Timestamp)],
    parent: Some(&ORACLE8_TYPES),
};

pub static SAPDB_TYPES: TypeMap = TypeMap {
    natives: &[
        plain(Bit, "BOOLEAN"),
        plain(Boolean, "BOOLEAN"),
        plain(TinyInt, "SMALLINT"),
        plain(SmallInt, "SMALLINT"),
        plain(Integer, "INTEGER"),
        plain(BigInt, "FIXED(38,0)"),
        plain(Real, "REAL"),
        plain(Float, "FLOAT"),
        plain(Double, "DOUBLE PRECISION"),
        sized(Decimal, "DECIMAL"),
        sized(Numeric, "DECIMAL"),
        sized(Char, "CHAR"),
        sized(VarChar, "VARCHAR"),
        plain(LongVarChar, "LONG"),
        plain(Clob, "LONG"),
        NativeType::sized_with_suffix(Binary, "CHAR", "BYTE"),
        NativeType::sized_with_suffix(VarBinary, "VARCHAR", "BYTE"),
        plain(LongVarBinary, "LONG BYTE"),
        plain(Blob, "LONG BYTE"),
        plain(Date, "DATE"),
        plain(Time, "TIME"),
        plain(Timestamp, "TIMESTAMP"),
    ],
    aliases: &[("fixed", Decimal), ("long ascii", LongVarChar), ("long unicode", LongVarChar)],
    parent: None,
};

pub fn postgresql() -> Dialect {
    Dialect {
        name: "postgresql",
        max_identifier_length: 63,
        primary_key_name: postgres_primary_key_name,
        is_table_excluded: postgres_system_table,
        normalize_column: normalize_postgres_column,
        alter_column: alter::alter_attributes,
        ..Dialect::standard(&POSTGRESQL_TYPES)
    }
}

pub fn mysql() -> Dialect {
    Dialect {
        name: "mysql",
        quote: QuoteStyle::Backtick,
        max_identifier_length: 64,
        auto_increment: AutoIncrement::Inline("AUTO_INCREMENT"),
        primary_key_drop: PrimaryKeyDrop::PrimaryKey,
        foreign_key_drop: ForeignKeyDrop::ForeignKey,
        index_drop: IndexDrop::AlterTable,
        normalize_column: normalize_mysql_column,
        alter_column: alter::modify_column,
        ..Dialect::standard(&MYSQL_TYPES)
    }
}

pub fn sqlite() -> Dialect {
    Dialect {
        name: "sqlite",
        auto_increment: AutoIncrement::IdentityPrimaryKey("PRIMARY KEY AUTOINCREMENT"),
        foreign_keys_embedded: true,
        primary_key_add: PrimaryKeyAdd::Unsupported,
        primary_key_drop: PrimaryKeyDrop::Unsupported,
        foreign_key_add: ForeignKeyAdd::Unsupported,
        foreign_key_drop: ForeignKeyDrop::Unsupported,
        should_generate_primary_keys: sqlite_should_generate_primary_keys,
        is_table_excluded: sqlite_system_table,
        alter_column: alter::unsupported,
        ..Dialect::standard(&SQLITE_TYPES)
    }
}

pub fn oracle8() -> Dialect {
    Dialect {
        name: "oracle8",
        max_identifier_length: 30,
        auto_increment: AutoIncrement::SequenceTrigger,
        primary_key_drop: PrimaryKeyDrop::PrimaryKey,
        add_column: "ADD",
        drop_table_suffix: " CASCADE CONSTRAINTS",
        is_table_excluded: oracle_system_table,
        normalize_column: normalize_oracle_column,
        alter_column: alter::modify_parenthesized,
        ..Dialect::standard(&ORACLE8_TYPES)
    }
}

pub fn oracle9() -> Dialect {
    Dialect {
        name: "oracle9",
        type_map: &ORACLE9_TYPES,
        ..oracle8()
    }
}

/// Oracle 10 keeps dropped tables in a recycle bin under their original name.
pub fn oracle10() -> Dialect {
    Dialect {
        name: "oracle10",
        drop_table_suffix: " CASCADE CONSTRAINTS PURGE",
        recycle_bin_query: Some("SELECT OBJECT_NAME FROM RECYCLEBIN WHERE OBJECT_NAME = ?"),
        ..oracle9()
    }
}

pub fn sapdb() -> Dialect {
    Dialect {
        name: "sapdb",
        max_identifier_length: 32,
        auto_increment: AutoIncrement::Inline("DEFAULT SERIAL"),
        primary_key_embedded: false,
        primary_key_add: PrimaryKeyAdd::Unnamed,
        primary_key_drop: PrimaryKeyDrop::PrimaryKey,
        foreign_key_add: ForeignKeyAdd::NamedForeignKey,
        foreign_key_drop: ForeignKeyDrop::ForeignKey,
        index_drop: IndexDrop::OnTable,
        add_column: "ADD",
        drop_table_suffix: " CASCADE",
        alter_column: alter::modify_column,
        ..Dialect::standard(&SAPDB_TYPES)
    }
}

/// MaxDB names its primary and foreign key constraints.
pub fn maxdb() -> Dialect {
    Dialect {
        name: "maxdb",
        primary_key_add: PrimaryKeyAdd::Named,
        foreign_key_add: ForeignKeyAdd::Constraint,
        foreign_key_drop: ForeignKeyDrop::Constraint,
        ..sapdb()
    }
}

/// PostgreSQL names inline primary keys `<table>_pkey`.
fn postgres_primary_key_name(table: &Table) -> String {
    format!("{}_pkey", table.name)
}

fn postgres_system_table(name: &str) -> bool {
    name.starts_with("pg_") || name.starts_with("sql_")
}

fn sqlite_system_table(name: &str) -> bool {
    name.starts_with("sqlite_")
}

fn oracle_system_table(name: &str) -> bool {
    name.starts_with("BIN$")
}

/// A lone auto-increment key column already declares the key inline.
fn sqlite_should_generate_primary_keys(columns: &[&Column]) -> bool {
    !(columns.len() == 1 && columns[0].auto_increment)
}

/// Strips `::type` casts from defaults and turns `nextval(..)` defaults into auto-increment.
fn normalize_postgres_column(mut raw: RawColumn) -> RawColumn {
    if let Some(default) = raw.default.take() {
        if default.starts_with("nextval(") {
            raw.auto_increment = true;
        } else {
            raw.default = Some(strip_postgres_cast(&default).to_string());
        }
    }
    raw
}

fn strip_postgres_cast(default: &str) -> &str {
    let trimmed = default.trim();
    if trimmed.starts_with('\'') {
        if let Some(end) = trimmed.rfind("'::") {
            return &trimmed[..=end];
        }
        return trimmed;
    }
    match trimmed.find("::") {
        Some(pos) => trimmed[..pos].trim_start_matches('(').trim_end_matches(')'),
        None => trimmed,
    }
}

/// `tinyint(1)` is MySQL's boolean; sign modifiers carry no logical meaning.
fn normalize_mysql_column(mut raw: RawColumn) -> RawColumn {
    let lower = raw.type_name.to_ascii_lowercase();
    let base = lower
        .trim_end_matches(" zerofill")
        .trim_end_matches(" unsigned")
        .to_string();
    if base == "tinyint" && raw.size == Some(1) {
        raw.type_name = "boolean".to_string();
        raw.size = None;
    } else {
        raw.type_name = base;
    }
    raw
}

/// Integral `NUMBER(p)` columns map back to the sized integer spellings.
fn normalize_oracle_column(mut raw: RawColumn) -> RawColumn {
    if raw.type_name.eq_ignore_ascii_case("NUMBER") && raw.scale.unwrap_or(0) == 0 {
        if let Some(precision @ (1 | 3 | 5 | 10 | 19)) = raw.size {
            raw.type_name = format!("NUMBER({})", precision);
            raw.size = None;
            raw.scale = None;
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(type_name: &str, default: Option<&str>) -> RawColumn {
        RawColumn {
            name: "c".to_string(),
            type_name: type_name.to_string(),
            size: None,
            scale: None,
            nullable: true,
            default: default.map(str::to_string),
            auto_increment: false,
        }
    }

    #[test]
    fn test_derived_dialects_inherit_unchanged_fields() {
        let o8 = oracle8();
        let o10 = oracle10();
        assert_eq!(o10.name, "oracle10");
        assert_eq!(o10.max_identifier_length, o8.max_identifier_length);
        assert_eq!(o10.auto_increment, AutoIncrement::SequenceTrigger);
        assert!(o8.recycle_bin_query.is_none());
        assert!(o10.recycle_bin_query.is_some());
        assert_eq!(o10.drop_table_suffix, " CASCADE CONSTRAINTS PURGE");

        let maxdb = maxdb();
        assert_eq!(maxdb.primary_key_add, PrimaryKeyAdd::Named);
        assert_eq!(sapdb().primary_key_add, PrimaryKeyAdd::Unnamed);
        assert_eq!(maxdb.drop_table_suffix, sapdb().drop_table_suffix);
    }

    #[test]
    fn test_postgres_defaults_are_normalized() {
        let text = normalize_postgres_column(raw("character varying", Some("''::character varying")));
        assert_eq!(text.default.as_deref(), Some("''"));

        let quoted = normalize_postgres_column(raw("text", Some("'a::b'::text")));
        assert_eq!(quoted.default.as_deref(), Some("'a::b'"));

        let number = normalize_postgres_column(raw("integer", Some("0")));
        assert_eq!(number.default.as_deref(), Some("0"));

        let serial = normalize_postgres_column(raw(
            "integer",
            Some("nextval('users_id_seq'::regclass)"),
        ));
        assert!(serial.auto_increment);
        assert!(serial.default.is_none());
    }

    #[test]
    fn test_mysql_tinyint_one_is_boolean() {
        let mut column = raw("tinyint", None);
        column.size = Some(1);
        let normalized = normalize_mysql_column(column);
        assert_eq!(normalized.type_name, "boolean");

        let unsigned = normalize_mysql_column(raw("bigint unsigned", None));
        assert_eq!(unsigned.type_name, "bigint");
    }

    #[test]
    fn test_oracle_integral_numbers() {
        let mut column = raw("NUMBER", None);
        column.size = Some(10);
        column.scale = Some(0);
        let normalized = normalize_oracle_column(column);
        assert_eq!(normalized.type_name, "NUMBER(10)");
        assert_eq!(
            ORACLE8_TYPES.logical_type(&normalized.type_name),
            Some(LogicalType::Integer)
        );

        let mut decimal = raw("NUMBER", None);
        decimal.size = Some(12);
        decimal.scale = Some(2);
        assert_eq!(normalize_oracle_column(decimal).type_name, "NUMBER");
    }

    #[test]
    fn test_system_tables() {
        assert!(postgres_system_table("pg_stat_statements"));
        assert!(!postgres_system_table("users"));
        assert!(sqlite_system_table("sqlite_sequence"));
        assert!(oracle_system_table("BIN$abc==$0"));
    }
}
