//! Core type system for the relational model

use serde::{Deserialize, Serialize};

/// SQL data types supported by the teaching subset.
///
/// `Null` is the type of the NULL literal; it compares with everything and
/// sits at the bottom of the dominance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// SMALLINT
    SmallInt,
    /// INTEGER
    Integer,
    /// DECIMAL
    Decimal,
    /// NUMERIC
    Numeric,
    /// REAL
    Real,
    /// FLOAT
    Float,
    /// DOUBLE PRECISION
    DoublePrecision,
    /// CHAR
    Char,
    /// VARCHAR
    Varchar,
    /// BIT
    Bit,
    /// BIT VARYING
    BitVarying,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP
    Timestamp,
    /// BOOLEAN
    Boolean,
    /// Type of the NULL literal
    Null,
}

/// Dominance order, most general first. Merging two comparable types picks
/// the one that appears earlier in this list.
const PRECEDENCE: [DataType; 16] = [
    DataType::DoublePrecision,
    DataType::Float,
    DataType::Real,
    DataType::Numeric,
    DataType::Decimal,
    DataType::Integer,
    DataType::SmallInt,
    DataType::Varchar,
    DataType::Char,
    DataType::BitVarying,
    DataType::Bit,
    DataType::Timestamp,
    DataType::Date,
    DataType::Time,
    DataType::Boolean,
    DataType::Null,
];

impl DataType {
    /// Returns true if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt
                | DataType::Integer
                | DataType::Decimal
                | DataType::Numeric
                | DataType::Real
                | DataType::Float
                | DataType::DoublePrecision
        )
    }

    /// Returns true if this is a character string type
    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Char | DataType::Varchar)
    }

    /// Returns true if this is a bit string type
    pub fn is_bit(&self) -> bool {
        matches!(self, DataType::Bit | DataType::BitVarying)
    }

    /// Returns true if this is a date/time type
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }

    /// Check whether two types may appear on the two sides of a comparison.
    ///
    /// Symmetric and reflexive. NULL compares with everything; otherwise
    /// both sides must belong to the same family (numeric, string, bit,
    /// temporal) or be the same type.
    pub fn is_comparable_with(&self, other: &DataType) -> bool {
        if self == other || matches!(self, DataType::Null) || matches!(other, DataType::Null) {
            return true;
        }
        (self.is_numeric() && other.is_numeric())
            || (self.is_string() && other.is_string())
            || (self.is_bit() && other.is_bit())
            || (self.is_temporal() && other.is_temporal())
    }

    /// Position of this type in the dominance order (0 = most general)
    fn precedence_index(&self) -> usize {
        PRECEDENCE
            .iter()
            .position(|t| t == self)
            .unwrap_or(PRECEDENCE.len())
    }

    /// The more general of two types per the fixed dominance order
    pub fn dominant_with(&self, other: &DataType) -> DataType {
        if self.precedence_index() <= other.precedence_index() {
            *self
        } else {
            *other
        }
    }

    /// The most general type of a non-empty sequence, or `None` when empty.
    ///
    /// `dominant([t]) == Some(t)` for every `t`.
    pub fn dominant<I>(types: I) -> Option<DataType>
    where
        I: IntoIterator<Item = DataType>,
    {
        types.into_iter().reduce(|a, b| a.dominant_with(&b))
    }

    /// Check whether a CAST from this type to `target` is defined.
    ///
    /// Identity casts always hold, NULL casts to anything, and every type
    /// renders as a character string. Strings cast to any parseable target;
    /// temporal casts follow the DATE/TIME/TIMESTAMP widenings.
    pub fn can_cast_to(&self, target: &DataType) -> bool {
        if self == target || matches!(self, DataType::Null) || target.is_string() {
            return true;
        }
        match self {
            t if t.is_numeric() => target.is_numeric(),
            t if t.is_string() => {
                target.is_numeric() || target.is_temporal() || target.is_bit()
                    || matches!(target, DataType::Boolean)
            }
            t if t.is_bit() => target.is_bit(),
            DataType::Date => matches!(target, DataType::Timestamp),
            DataType::Time => matches!(target, DataType::Timestamp),
            DataType::Timestamp => matches!(target, DataType::Date | DataType::Time),
            _ => false,
        }
    }

    /// Parse a SQL type spelling ("INT", "DOUBLE PRECISION", "VARCHAR(40)").
    ///
    /// Length/precision parameters are tolerated and discarded; the teaching
    /// subset types on names only. Returns `None` for spellings outside the
    /// subset.
    pub fn parse(s: &str) -> Option<DataType> {
        let upper = s.trim().to_uppercase();
        // Strip a trailing parameter list: VARCHAR(40), DECIMAL(10,2)
        let base = match upper.find('(') {
            Some(open) if upper.ends_with(')') => upper[..open].trim_end().to_string(),
            _ => upper,
        };
        match base.as_str() {
            "SMALLINT" | "INT2" => Some(DataType::SmallInt),
            "INT" | "INTEGER" | "INT4" => Some(DataType::Integer),
            "DECIMAL" | "DEC" => Some(DataType::Decimal),
            "NUMERIC" => Some(DataType::Numeric),
            "REAL" => Some(DataType::Real),
            "FLOAT" => Some(DataType::Float),
            "DOUBLE PRECISION" | "DOUBLE" | "FLOAT8" => Some(DataType::DoublePrecision),
            "CHAR" | "CHARACTER" => Some(DataType::Char),
            "VARCHAR" | "CHARACTER VARYING" | "TEXT" => Some(DataType::Varchar),
            "BIT" => Some(DataType::Bit),
            "BIT VARYING" | "VARBIT" => Some(DataType::BitVarying),
            "DATE" => Some(DataType::Date),
            "TIME" => Some(DataType::Time),
            "TIMESTAMP" | "DATETIME" => Some(DataType::Timestamp),
            "BOOL" | "BOOLEAN" => Some(DataType::Boolean),
            "NULL" => Some(DataType::Null),
            _ => None,
        }
    }

    /// Canonical SQL spelling
    pub fn display_name(&self) -> &'static str {
        match self {
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::Decimal => "DECIMAL",
            DataType::Numeric => "NUMERIC",
            DataType::Real => "REAL",
            DataType::Float => "FLOAT",
            DataType::DoublePrecision => "DOUBLE PRECISION",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::Bit => "BIT",
            DataType::BitVarying => "BIT VARYING",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Boolean => "BOOLEAN",
            DataType::Null => "NULL",
        }
    }

    /// All sixteen types, in dominance order
    pub fn all() -> &'static [DataType] {
        &PRECEDENCE
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
