use std::fmt;

use serde::{Deserialize, Serialize};

/// Vendor-neutral column type. Every dialect maps each of these to a native type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    Char,
    VarChar,
    LongVarChar,
    Clob,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
}

/// How a logical type carries its size information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    None,
    Length,
    PrecisionScale,
}

impl LogicalType {
    pub const ALL: [LogicalType; 22] = [
        LogicalType::Bit,
        LogicalType::Boolean,
        LogicalType::TinyInt,
        LogicalType::SmallInt,
        LogicalType::Integer,
        LogicalType::BigInt,
        LogicalType::Real,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::Decimal,
        LogicalType::Numeric,
        LogicalType::Char,
        LogicalType::VarChar,
        LogicalType::LongVarChar,
        LogicalType::Clob,
        LogicalType::Binary,
        LogicalType::VarBinary,
        LogicalType::LongVarBinary,
        LogicalType::Blob,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Timestamp,
    ];

    pub fn size_kind(self) -> SizeKind {
        match self {
            LogicalType::Char
            | LogicalType::VarChar
            | LogicalType::Binary
            | LogicalType::VarBinary => SizeKind::Length,
            LogicalType::Decimal | LogicalType::Numeric => SizeKind::PrecisionScale,
            _ => SizeKind::None,
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(
            self,
            LogicalType::Char | LogicalType::VarChar | LogicalType::LongVarChar | LogicalType::Clob
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Bit => "BIT",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Real => "REAL",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::Numeric => "NUMERIC",
            LogicalType::Char => "CHAR",
            LogicalType::VarChar => "VARCHAR",
            LogicalType::LongVarChar => "LONGVARCHAR",
            LogicalType::Clob => "CLOB",
            LogicalType::Binary => "BINARY",
            LogicalType::VarBinary => "VARBINARY",
            LogicalType::LongVarBinary => "LONGVARBINARY",
            LogicalType::Blob => "BLOB",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical type plus size information.
///
/// `size` is the length for character/binary types and the precision for
/// decimal types; `scale` only applies to decimal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    pub logical: LogicalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl ColumnType {
    pub fn new(logical: LogicalType) -> Self {
        Self {
            logical,
            size: None,
            scale: None,
        }
    }

    pub fn sized(logical: LogicalType, size: u32) -> Self {
        Self {
            logical,
            size: Some(size),
            scale: None,
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            logical: LogicalType::Decimal,
            size: Some(precision),
            scale: Some(scale),
        }
    }

    /// Drops size information the logical type does not carry, so that types
    /// read from different vendors compare equal.
    pub fn normalized(self) -> Self {
        match self.logical.size_kind() {
            SizeKind::None => Self::new(self.logical),
            SizeKind::Length => Self {
                scale: None,
                ..self
            },
            SizeKind::PrecisionScale => Self {
                scale: if self.size.is_some() {
                    Some(self.scale.unwrap_or(0))
                } else {
                    None
                },
                ..self
            },
        }
    }
}

impl From<LogicalType> for ColumnType {
    fn from(logical: LogicalType) -> Self {
        ColumnType::new(logical)
    }
}
