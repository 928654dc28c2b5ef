//! Decoded Modbus values and the data-type token vocabulary.
//!
//! The source's `ModbusData` object accumulates decoded values as a
//! heterogeneous Python list. Here that becomes a small tagged [`Value`]
//! sum type (integer, signed integer, float, text, raw bytes) plus a
//! [`DataType`] enum for the ~30 named encodings a register group can be
//! decoded as.

use std::fmt;
use std::str::FromStr;

/// A single decoded scalar. Every data type in [`DataType`] produces one
/// of these five shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single coil/discrete-input bit.
    Bit(bool),
    /// Any unsigned-integer decoding (`uintN`, `binN`/`hexN` formatting aside).
    UInt(u64),
    /// Any signed-integer or mod-1k/mod-10k decoding.
    SInt(i64),
    /// `float`/`dbl`/`engy`.
    Float(f64),
    /// `ascii`.
    Text(String),
    /// Raw-bytes mode, bypassing typed decoding entirely.
    Raw(Vec<u8>),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Bit(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::UInt(v) => *v as f64,
            Value::SInt(v) => *v as f64,
            Value::Float(v) => *v,
            Value::Text(_) | Value::Raw(_) => 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bit(b) => write!(f, "{}", *b as u8),
            Value::UInt(v) => write!(f, "{v}"),
            Value::SInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Raw(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
        }
    }
}

/// Named data-type tokens the decoder understands, grouped by register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Uint16,
    Sint16,
    Sm1k16,
    Sm10k16,
    Bin,
    Hex,
    Ascii,
    Uint8,
    Sint8,
    Uint32,
    Sint32,
    Float,
    Um1k32,
    Sm1k32,
    Um10k32,
    Sm10k32,
    Uint48,
    Sint48,
    Um1k48,
    Sm1k48,
    Um10k48,
    Sm10k48,
    Uint64,
    Sint64,
    Um1k64,
    Sm1k64,
    Um10k64,
    Sm10k64,
    Dbl,
    Engy,
}

impl DataType {
    /// Number of 16-bit registers one value of this type occupies (Table 1).
    /// `Uint8`/`Sint8` pack two values per register, so their "width" for
    /// grouping purposes is still 1 register, but they yield two values.
    pub fn registers_per_value(&self) -> usize {
        use DataType::*;
        match self {
            Uint16 | Sint16 | Sm1k16 | Sm10k16 | Bin | Hex | Ascii | Uint8 | Sint8 => 1,
            Uint32 | Sint32 | Float | Um1k32 | Sm1k32 | Um10k32 | Sm10k32 => 2,
            Uint48 | Sint48 | Um1k48 | Sm1k48 | Um10k48 | Sm10k48 => 3,
            Uint64 | Sint64 | Um1k64 | Sm1k64 | Um10k64 | Sm10k64 | Dbl | Engy => 4,
        }
    }

    /// `true` for the two token names that pack two values into one register.
    pub fn is_byte_packed(&self) -> bool {
        matches!(self, DataType::Uint8 | DataType::Sint8)
    }

    pub fn as_token(&self) -> &'static str {
        use DataType::*;
        match self {
            Uint16 => "uint16",
            Sint16 => "sint16",
            Sm1k16 => "sm1k16",
            Sm10k16 => "sm10k16",
            Bin => "bin",
            Hex => "hex",
            Ascii => "ascii",
            Uint8 => "uint8",
            Sint8 => "sint8",
            Uint32 => "uint32",
            Sint32 => "sint32",
            Float => "float",
            Um1k32 => "um1k32",
            Sm1k32 => "sm1k32",
            Um10k32 => "um10k32",
            Sm10k32 => "sm10k32",
            Uint48 => "uint48",
            Sint48 => "sint48",
            Um1k48 => "um1k48",
            Sm1k48 => "sm1k48",
            Um10k48 => "um10k48",
            Sm10k48 => "sm10k48",
            Uint64 => "uint64",
            Sint64 => "sint64",
            Um1k64 => "um1k64",
            Sm1k64 => "sm1k64",
            Um10k64 => "um10k64",
            Sm10k64 => "sm10k64",
            Dbl => "dbl",
            Engy => "engy",
        }
    }
}

impl FromStr for DataType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use DataType::*;
        Ok(match s.to_ascii_lowercase().as_str() {
            "uint16" => Uint16,
            "sint16" => Sint16,
            "sm1k16" => Sm1k16,
            "sm10k16" => Sm10k16,
            "bin" => Bin,
            "hex" => Hex,
            "ascii" => Ascii,
            "uint8" => Uint8,
            "sint8" => Sint8,
            "uint32" => Uint32,
            "sint32" => Sint32,
            "float" => Float,
            "um1k32" => Um1k32,
            "sm1k32" => Sm1k32,
            "um10k32" => Um10k32,
            "sm10k32" => Sm10k32,
            "uint48" => Uint48,
            "sint48" => Sint48,
            "um1k48" => Um1k48,
            "sm1k48" => Sm1k48,
            "um10k48" => Um10k48,
            "sm10k48" => Sm10k48,
            "uint64" => Uint64,
            "sint64" => Sint64,
            "um1k64" => Um1k64,
            "sm1k64" => Sm1k64,
            "um10k64" => Um10k64,
            "sm10k64" => Sm10k64,
            "dbl" => Dbl,
            "engy" => Engy,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        for token in [
            "uint16", "sint48", "um1k32", "sm10k64", "engy", "dbl", "ascii", "bin", "hex",
        ] {
            let dt: DataType = token.parse().unwrap();
            assert_eq!(dt.as_token(), token);
        }
    }

    #[test]
    fn unknown_token_rejected() {
        assert!("not_a_type".parse::<DataType>().is_err());
    }

    #[test]
    fn widths_match_table_1() {
        assert_eq!(DataType::Uint16.registers_per_value(), 1);
        assert_eq!(DataType::Float.registers_per_value(), 2);
        assert_eq!(DataType::Uint48.registers_per_value(), 3);
        assert_eq!(DataType::Engy.registers_per_value(), 4);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::UInt(42).to_string(), "42");
        assert_eq!(Value::SInt(-5).to_string(), "-5");
        assert_eq!(Value::Raw(vec![0x0A, 0xFF]).to_string(), "0A FF");
    }
}
