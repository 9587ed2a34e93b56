//! Typed parameter values and their transport text codec
//!
//! All values cross the MQTT boundary as text. The codec here is canonical
//! and round-trip stable: `decode(ty, &encode(v)) == v` for every
//! representable value, and `encode(&decode(ty, s)) == s` for canonical
//! inputs.
//!
//! # Supported types
//!
//! - `Bool` - encoded as `1`/`0`, decoder also accepts `true`/`false`
//! - `I32` / `U32` - decimal integers
//! - `F32` / `F64` - shortest decimal representation that round-trips
//! - `TimeSpan` - a daily time window packed as `HHMMhhmm` (start/end),
//!   encoded as exactly eight digits
//! - `Str` - fixed-capacity string (max 63 chars)

pub mod cell;

pub use cell::ParamCell;

use crate::error::ParamsError;
use core::fmt::Write;
use heapless::String;

/// Maximum string parameter length
pub const MAX_STRING_LEN: usize = 63;

/// Maximum encoded payload length
pub const MAX_VALUE_LEN: usize = 64;

/// Encoded transport payload
pub type ValueText = String<MAX_VALUE_LEN>;

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Boolean value
    Bool,
    /// 32-bit signed integer
    I32,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Daily time window packed as HHMMhhmm
    TimeSpan,
    /// String value (max 63 chars)
    Str,
}

/// Parameter value (tagged union of supported types)
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
    TimeSpan(u32),
    Str(String<MAX_STRING_LEN>),
}

impl ParamValue {
    /// Get the type tag of this value
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::I32(_) => ParamType::I32,
            ParamValue::U32(_) => ParamType::U32,
            ParamValue::F32(_) => ParamType::F32,
            ParamValue::F64(_) => ParamType::F64,
            ParamValue::TimeSpan(_) => ParamType::TimeSpan,
            ParamValue::Str(_) => ParamType::Str,
        }
    }

    /// Create a string value, truncating to capacity
    pub fn str_from(s: &str) -> Self {
        let mut out = String::new();
        let take = s.len().min(MAX_STRING_LEN);
        // Truncation can only happen on oversized caller input
        let _ = out.push_str(&s[..take]);
        ParamValue::Str(out)
    }

    /// Encode the value into its canonical transport text
    pub fn encode(&self) -> ValueText {
        let mut out = ValueText::new();
        let res = match self {
            ParamValue::Bool(b) => out.push_str(if *b { "1" } else { "0" }).map_err(|_| core::fmt::Error),
            ParamValue::I32(v) => write!(out, "{}", v),
            ParamValue::U32(v) => write!(out, "{}", v),
            ParamValue::F32(v) => write!(out, "{}", v),
            ParamValue::F64(v) => write!(out, "{}", v),
            ParamValue::TimeSpan(v) => write!(out, "{:08}", v),
            ParamValue::Str(s) => out.push_str(s.as_str()).map_err(|_| core::fmt::Error),
        };
        debug_assert!(res.is_ok());
        out
    }

    /// Decode a transport payload into a value of the given type
    pub fn decode(ty: ParamType, payload: &str) -> Result<Self, ParamsError> {
        let s = payload.trim();
        match ty {
            ParamType::Bool => match s {
                "1" => Ok(ParamValue::Bool(true)),
                "0" => Ok(ParamValue::Bool(false)),
                _ if s.eq_ignore_ascii_case("true") => Ok(ParamValue::Bool(true)),
                _ if s.eq_ignore_ascii_case("false") => Ok(ParamValue::Bool(false)),
                _ => Err(ParamsError::Parse),
            },
            ParamType::I32 => s.parse::<i32>().map(ParamValue::I32).map_err(|_| ParamsError::Parse),
            ParamType::U32 => s.parse::<u32>().map(ParamValue::U32).map_err(|_| ParamsError::Parse),
            ParamType::F32 => s.parse::<f32>().map(ParamValue::F32).map_err(|_| ParamsError::Parse),
            ParamType::F64 => s.parse::<f64>().map(ParamValue::F64).map_err(|_| ParamsError::Parse),
            ParamType::TimeSpan => {
                let v = s.parse::<u32>().map_err(|_| ParamsError::Parse)?;
                if timespan_valid(v) {
                    Ok(ParamValue::TimeSpan(v))
                } else {
                    Err(ParamsError::Parse)
                }
            }
            ParamType::Str => {
                if s.len() > MAX_STRING_LEN {
                    return Err(ParamsError::Parse);
                }
                Ok(ParamValue::str_from(s))
            }
        }
    }
}

/// Validate a packed HHMMhhmm window: both halves must be valid wall times
fn timespan_valid(v: u32) -> bool {
    let start = v / 10000;
    let end = v % 10000;
    let valid_time = |t: u32| (t / 100) < 24 && (t % 100) < 60;
    valid_time(start) && valid_time(end)
}

/// Optional [min, max] clamp bounds for an entry
///
/// Bounds apply to numeric types only; for `Bool`, `TimeSpan` and `Str`
/// every well-typed value is considered in range.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamLimits {
    /// Minimum allowed value (inclusive)
    pub min: ParamValue,
    /// Maximum allowed value (inclusive)
    pub max: ParamValue,
}

impl ParamLimits {
    /// Create bounds; both must share the value's type to be effective
    pub fn new(min: ParamValue, max: ParamValue) -> Self {
        Self { min, max }
    }

    /// Check whether `value` lies within [min, max] (inclusive)
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (value, &self.min, &self.max) {
            (ParamValue::I32(v), ParamValue::I32(min), ParamValue::I32(max)) => v >= min && v <= max,
            (ParamValue::U32(v), ParamValue::U32(min), ParamValue::U32(max)) => v >= min && v <= max,
            (ParamValue::F32(v), ParamValue::F32(min), ParamValue::F32(max)) => v >= min && v <= max,
            (ParamValue::F64(v), ParamValue::F64(min), ParamValue::F64(max)) => v >= min && v <= max,
            // Non-numeric or mismatched bounds never reject
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_types() {
        let values = [
            ParamValue::Bool(true),
            ParamValue::Bool(false),
            ParamValue::I32(-1234),
            ParamValue::U32(4_000_000_000),
            ParamValue::F32(3.5),
            ParamValue::F32(-0.25),
            ParamValue::F64(1.0e-3),
            ParamValue::TimeSpan(21300630),
            ParamValue::TimeSpan(0),
            ParamValue::str_from("hello world"),
        ];

        for v in values {
            let text = v.encode();
            let back = ParamValue::decode(v.param_type(), text.as_str()).unwrap();
            assert_eq!(v, back, "round trip failed for {:?}", v);
        }
    }

    #[test]
    fn test_canonical_encoding_stable() {
        // encode(decode(s)) == s for canonical inputs
        for (ty, s) in [
            (ParamType::Bool, "1"),
            (ParamType::I32, "-42"),
            (ParamType::U32, "42"),
            (ParamType::F32, "1.5"),
            (ParamType::TimeSpan, "22000700"),
            (ParamType::Str, "abc"),
        ] {
            let v = ParamValue::decode(ty, s).unwrap();
            assert_eq!(v.encode().as_str(), s);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(ParamValue::decode(ParamType::I32, "abc"), Err(ParamsError::Parse));
        assert_eq!(ParamValue::decode(ParamType::U32, "-1"), Err(ParamsError::Parse));
        assert_eq!(ParamValue::decode(ParamType::Bool, "maybe"), Err(ParamsError::Parse));
        assert_eq!(ParamValue::decode(ParamType::F32, ""), Err(ParamsError::Parse));
        // 25:00 start is not a wall time
        assert_eq!(ParamValue::decode(ParamType::TimeSpan, "25000000"), Err(ParamsError::Parse));
        assert_eq!(ParamValue::decode(ParamType::TimeSpan, "00600000"), Err(ParamsError::Parse));
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(
            ParamValue::decode(ParamType::I32, " 15\n").unwrap(),
            ParamValue::I32(15)
        );
    }

    #[test]
    fn test_limits_inclusive_bounds() {
        let limits = ParamLimits::new(ParamValue::I32(0), ParamValue::I32(100));
        assert!(limits.contains(&ParamValue::I32(0)));
        assert!(limits.contains(&ParamValue::I32(100)));
        assert!(limits.contains(&ParamValue::I32(50)));
        assert!(!limits.contains(&ParamValue::I32(-1)));
        assert!(!limits.contains(&ParamValue::I32(101)));
    }

    #[test]
    fn test_limits_ignore_non_numeric() {
        let limits = ParamLimits::new(ParamValue::I32(0), ParamValue::I32(10));
        // Mismatched type never rejects at the limits layer
        assert!(limits.contains(&ParamValue::str_from("x")));
        assert!(limits.contains(&ParamValue::Bool(true)));
    }

    #[test]
    fn test_float_limits() {
        let limits = ParamLimits::new(ParamValue::F32(-1.5), ParamValue::F32(1.5));
        assert!(limits.contains(&ParamValue::F32(1.5)));
        assert!(!limits.contains(&ParamValue::F32(1.6)));
    }
}
