//! Conversion between gateway-native raw values and typed values
//!
//! Two representations are handled:
//!
//! * the JSON-native form a gateway returns after it has decoded the registers itself
//!   ([`decode`] / [`encode`])
//! * the raw 16-bit register form ([`from_registers`] / [`to_registers`])
//!
//! Everything in here is pure and may be called concurrently.

use std::fmt::Formatter;
use std::str::FromStr;

use serde_json::Number;

use crate::error::{DecodeError, EncodeError};

/// coil status word meaning ON
pub(crate) const COIL_ON: u16 = 0xFF00;
/// coil status word meaning OFF
pub(crate) const COIL_OFF: u16 = 0x0000;

/// Type tag describing how a raw value is laid out on the device
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// single coil
    Bool,
    /// unsigned 16-bit integer, one register
    UInt16,
    /// signed 16-bit integer, one register
    Int16,
    /// unsigned 32-bit integer, two registers, most-significant register first
    UInt32,
    /// signed 32-bit integer, two registers, most-significant register first
    Int32,
    /// unsigned 32-bit integer, two registers, least-significant register first
    UInt32Le,
    /// signed 32-bit integer, two registers, least-significant register first
    Int32Le,
    /// IEEE 754 single precision, two registers, most-significant register first
    Float32,
    /// IEEE 754 single precision, two registers, least-significant register first
    Float32Le,
    /// IEEE 754 double precision, four registers, most-significant register first
    Float64,
}

/// A decoded value
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    /// coil state
    Bool(bool),
    /// any of the integer types
    Integer(i64),
    /// either float type, or any numeric value after scaling
    Float(f64),
}

impl DataType {
    /// every supported type, in tag order
    pub const ALL: [DataType; 10] = [
        DataType::Bool,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::UInt32Le,
        DataType::Int32Le,
        DataType::Float32,
        DataType::Float32Le,
        DataType::Float64,
    ];

    /// canonical tag sent on the wire
    pub fn tag(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt32Le => "uint32le",
            DataType::Int32Le => "int32le",
            DataType::Float32 => "float32",
            DataType::Float32Le => "float32le",
            DataType::Float64 => "float64",
        }
    }

    /// number of 16-bit registers (or coils) the type occupies
    pub fn register_count(self) -> usize {
        match self {
            DataType::Bool | DataType::UInt16 | DataType::Int16 => 1,
            DataType::UInt32
            | DataType::Int32
            | DataType::UInt32Le
            | DataType::Int32Le
            | DataType::Float32
            | DataType::Float32Le => 2,
            DataType::Float64 => 4,
        }
    }

    // inclusive integer range, None for the non-integer types
    fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            DataType::UInt16 => Some((0, u16::MAX as i64)),
            DataType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::UInt32 | DataType::UInt32Le => Some((0, u32::MAX as i64)),
            DataType::Int32 | DataType::Int32Le => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::Bool | DataType::Float32 | DataType::Float32Le | DataType::Float64 => None,
        }
    }
}

impl FromStr for DataType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" | "bit" => Ok(DataType::Bool),
            "uint16" | "u16" => Ok(DataType::UInt16),
            "int16" | "i16" => Ok(DataType::Int16),
            "uint32" | "u32" => Ok(DataType::UInt32),
            "int32" | "i32" => Ok(DataType::Int32),
            "uint32le" | "u32le" => Ok(DataType::UInt32Le),
            "int32le" | "i32le" => Ok(DataType::Int32Le),
            "float32" | "float" | "f32" => Ok(DataType::Float32),
            "float32le" | "floatle" | "f32le" => Ok(DataType::Float32Le),
            "float64" | "double" | "f64" => Ok(DataType::Float64),
            _ => Err(DecodeError::UnsupportedType(s.to_string())),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Value {
    /// numeric view of the value, None for booleans
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(_) => None,
            Value::Integer(x) => Some(*x as f64),
            Value::Float(x) => Some(*x),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(x) => write!(f, "{x}"),
            Value::Integer(x) => write!(f, "{x}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Integer(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

fn describe(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(x) => format!("bool ({x})"),
        serde_json::Value::Number(x) => format!("number ({x})"),
        serde_json::Value::String(x) => format!("string ({x:?})"),
        serde_json::Value::Array(_) => "array".to_string(),
        serde_json::Value::Object(_) => "object".to_string(),
    }
}

/// Decode a JSON-native value returned by the gateway under the requested type
pub fn decode(raw: &serde_json::Value, data_type: DataType) -> Result<Value, DecodeError> {
    let wrong_kind = || DecodeError::WrongKind {
        data_type,
        found: describe(raw),
    };

    if raw.is_null() {
        return Err(DecodeError::MissingValue);
    }

    match data_type {
        DataType::Bool => match raw {
            serde_json::Value::Bool(x) => Ok(Value::Bool(*x)),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(DecodeError::OutOfRange {
                    data_type,
                    value: n.to_string(),
                }),
            },
            _ => Err(wrong_kind()),
        },
        DataType::Float32 | DataType::Float32Le => {
            let x = raw.as_f64().ok_or_else(wrong_kind)?;
            if x.is_finite() && x.abs() > f32::MAX as f64 {
                return Err(DecodeError::OutOfRange {
                    data_type,
                    value: x.to_string(),
                });
            }
            Ok(Value::Float(x))
        }
        DataType::Float64 => raw.as_f64().map(Value::Float).ok_or_else(wrong_kind),
        _ => {
            let number = match raw {
                serde_json::Value::Number(n) => n,
                _ => return Err(wrong_kind()),
            };
            let value = integer_from_number(number).ok_or_else(|| DecodeError::OutOfRange {
                data_type,
                value: number.to_string(),
            })?;
            check_integer_range(data_type, value).ok_or_else(|| DecodeError::OutOfRange {
                data_type,
                value: number.to_string(),
            })
        }
    }
}

// integers, or floats that carry an integral value
fn integer_from_number(n: &Number) -> Option<i64> {
    if let Some(x) = n.as_i64() {
        return Some(x);
    }
    if n.as_u64().is_some() {
        // above i64::MAX, out of range for every supported integer type
        return None;
    }
    let x = n.as_f64()?;
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

fn check_integer_range(data_type: DataType, value: i64) -> Option<Value> {
    let (min, max) = data_type.integer_range()?;
    if value < min || value > max {
        return None;
    }
    Some(Value::Integer(value))
}

/// Encode a value into the JSON-native form expected by the gateway for a write
///
/// Single precision types narrow through `f32`. The loss of precision this implies
/// is intrinsic to the type and is not reported.
pub fn encode(value: Value, data_type: DataType) -> Result<serde_json::Value, EncodeError> {
    match data_type {
        DataType::Bool => match value {
            Value::Bool(x) => Ok(serde_json::Value::Bool(x)),
            Value::Integer(0) => Ok(serde_json::Value::Bool(false)),
            Value::Integer(1) => Ok(serde_json::Value::Bool(true)),
            _ => Err(EncodeError::WrongKind {
                data_type,
                found: value.kind(),
            }),
        },
        DataType::Float32 | DataType::Float32Le => {
            let narrowed = narrow_f32(value, data_type)?;
            float_to_json(narrowed as f64)
        }
        DataType::Float64 => {
            let x = value.as_f64().ok_or(EncodeError::WrongKind {
                data_type,
                found: value.kind(),
            })?;
            float_to_json(x)
        }
        _ => {
            let x = encode_integer(value, data_type)?;
            Ok(serde_json::Value::Number(x.into()))
        }
    }
}

fn float_to_json(x: f64) -> Result<serde_json::Value, EncodeError> {
    Number::from_f64(x)
        .map(serde_json::Value::Number)
        .ok_or(EncodeError::NotFinite(x))
}

fn narrow_f32(value: Value, data_type: DataType) -> Result<f32, EncodeError> {
    let x = value.as_f64().ok_or(EncodeError::WrongKind {
        data_type,
        found: value.kind(),
    })?;
    if !x.is_finite() {
        return Err(EncodeError::NotFinite(x));
    }
    if x.abs() > f32::MAX as f64 {
        return Err(EncodeError::OutOfRange {
            data_type,
            value: x.to_string(),
        });
    }
    Ok(x as f32)
}

fn encode_integer(value: Value, data_type: DataType) -> Result<i64, EncodeError> {
    let out_of_range = |v: String| EncodeError::OutOfRange { data_type, value: v };
    let x = match value {
        Value::Integer(x) => x,
        Value::Float(x) => {
            if !x.is_finite() {
                return Err(EncodeError::NotFinite(x));
            }
            if x.fract() != 0.0 || x < i64::MIN as f64 || x > i64::MAX as f64 {
                return Err(out_of_range(x.to_string()));
            }
            x as i64
        }
        Value::Bool(_) => {
            return Err(EncodeError::WrongKind {
                data_type,
                found: value.kind(),
            })
        }
    };
    let (min, max) = data_type.integer_range().ok_or(EncodeError::WrongKind {
        data_type,
        found: value.kind(),
    })?;
    if x < min || x > max {
        return Err(out_of_range(x.to_string()));
    }
    Ok(x)
}

/// Decode raw registers (or a single coil status word for `bool`) under the requested type
///
/// The number of registers must match [`DataType::register_count`] exactly.
pub fn from_registers(registers: &[u16], data_type: DataType) -> Result<Value, DecodeError> {
    let expected = data_type.register_count();
    if registers.len() != expected {
        return Err(DecodeError::RegisterCount {
            data_type,
            expected,
            actual: registers.len(),
        });
    }

    let high_low = |high: u16, low: u16| ((high as u32) << 16) | (low as u32);

    let value = match data_type {
        DataType::Bool => match registers[0] {
            COIL_ON => Value::Bool(true),
            COIL_OFF => Value::Bool(false),
            other => return Err(DecodeError::UnknownCoilState(other)),
        },
        DataType::UInt16 => Value::Integer(registers[0] as i64),
        DataType::Int16 => Value::Integer(registers[0] as i16 as i64),
        DataType::UInt32 => Value::Integer(high_low(registers[0], registers[1]) as i64),
        DataType::Int32 => Value::Integer(high_low(registers[0], registers[1]) as i32 as i64),
        DataType::UInt32Le => Value::Integer(high_low(registers[1], registers[0]) as i64),
        DataType::Int32Le => Value::Integer(high_low(registers[1], registers[0]) as i32 as i64),
        DataType::Float32 => {
            Value::Float(f32::from_bits(high_low(registers[0], registers[1])) as f64)
        }
        DataType::Float32Le => {
            Value::Float(f32::from_bits(high_low(registers[1], registers[0])) as f64)
        }
        DataType::Float64 => {
            let bits = registers
                .iter()
                .fold(0u64, |acc, reg| (acc << 16) | (*reg as u64));
            Value::Float(f64::from_bits(bits))
        }
    };

    Ok(value)
}

/// Encode a value into raw registers (or a single coil status word for `bool`)
pub fn to_registers(value: Value, data_type: DataType) -> Result<Vec<u16>, EncodeError> {
    let split = |x: u32| [(x >> 16) as u16, x as u16];

    let registers = match data_type {
        DataType::Bool => match encode(value, data_type)? {
            serde_json::Value::Bool(true) => vec![COIL_ON],
            _ => vec![COIL_OFF],
        },
        DataType::UInt16 | DataType::Int16 => {
            vec![encode_integer(value, data_type)? as u16]
        }
        DataType::UInt32 | DataType::Int32 => {
            split(encode_integer(value, data_type)? as u32).to_vec()
        }
        DataType::UInt32Le | DataType::Int32Le => {
            let [high, low] = split(encode_integer(value, data_type)? as u32);
            vec![low, high]
        }
        DataType::Float32 => split(narrow_f32(value, data_type)?.to_bits()).to_vec(),
        DataType::Float32Le => {
            let [high, low] = split(narrow_f32(value, data_type)?.to_bits());
            vec![low, high]
        }
        DataType::Float64 => {
            let x = value.as_f64().ok_or(EncodeError::WrongKind {
                data_type,
                found: value.kind(),
            })?;
            let bits = x.to_bits();
            vec![
                (bits >> 48) as u16,
                (bits >> 32) as u16,
                (bits >> 16) as u16,
                bits as u16,
            ]
        }
    };

    Ok(registers)
}

/// Decode any payload shape a gateway returns for a successful read
///
/// * a bare JSON scalar is decoded with [`decode`]
/// * an object with a `registers` array is decoded with [`from_registers`]
/// * an object with a `value` field is decoded with [`decode`]
pub fn decode_payload(raw: &serde_json::Value, data_type: DataType) -> Result<Value, DecodeError> {
    let object = match raw {
        serde_json::Value::Object(object) => object,
        _ => return decode(raw, data_type),
    };

    if let Some(registers) = object.get("registers") {
        let registers = parse_registers(registers)?;
        return from_registers(&registers, data_type);
    }

    match object.get("value") {
        Some(value) => decode(value, data_type),
        None => Err(DecodeError::MissingValue),
    }
}

fn parse_registers(raw: &serde_json::Value) -> Result<Vec<u16>, DecodeError> {
    let items = raw
        .as_array()
        .ok_or_else(|| DecodeError::BadRegister(describe(raw)))?;

    items
        .iter()
        .map(|x| {
            x.as_u64()
                .and_then(|x| u16::try_from(x).ok())
                .ok_or_else(|| DecodeError::BadRegister(describe(x)))
        })
        .collect()
}

/// Apply an engineering-unit multiplier to a decoded value
///
/// Numeric values are always scaled in floating point, even when the raw type is an
/// integer. Booleans are returned unchanged.
pub fn scale(value: Value, scale: f64) -> Value {
    match value {
        Value::Bool(_) => value,
        Value::Integer(x) => Value::Float(x as f64 * scale),
        Value::Float(x) => Value::Float(x * scale),
    }
}
