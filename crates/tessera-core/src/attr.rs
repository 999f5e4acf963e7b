//! Attribute value types, tagged values, and lossless conversion.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The storage type of an attribute.
///
/// A closed set of fixed-width numeric kinds. Every attribute's storage
/// width is determined solely by its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit IEEE float.
    Float32,
    /// 64-bit IEEE float.
    Float64,
}

impl AttributeType {
    /// Every attribute type, in declaration order.
    pub const ALL: [AttributeType; 10] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// Storage width of one slot in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Whether this is a floating-point type.
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// The zero value of this type, used for initialization and reset.
    pub fn zero(self) -> AttrValue {
        match self {
            Self::Int8 => AttrValue::Int8(0),
            Self::Int16 => AttrValue::Int16(0),
            Self::Int32 => AttrValue::Int32(0),
            Self::Int64 => AttrValue::Int64(0),
            Self::UInt8 => AttrValue::UInt8(0),
            Self::UInt16 => AttrValue::UInt16(0),
            Self::UInt32 => AttrValue::UInt32(0),
            Self::UInt64 => AttrValue::UInt64(0),
            Self::Float32 => AttrValue::Float32(0.0),
            Self::Float64 => AttrValue::Float64(0.0),
        }
    }

    /// Canonical lowercase name (`"int32"`, `"float64"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a type name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown attribute type '{0}'")]
pub struct ParseAttributeTypeError(pub String);

impl FromStr for AttributeType {
    type Err = ParseAttributeTypeError;

    /// Parses canonical names plus the short dtype codes used by scenario
    /// files: `b`/`i1`, `h`/`i2`, `i`/`i4`, `l`/`i8`, `B`/`u1`, `H`/`u2`,
    /// `I`/`u4`, `L`/`u8`, `f`/`f4`, `d`/`f8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "int8" | "b" | "i1" => Self::Int8,
            "int16" | "h" | "i2" => Self::Int16,
            "int32" | "i" | "i4" => Self::Int32,
            "int64" | "l" | "i8" => Self::Int64,
            "uint8" | "B" | "u1" => Self::UInt8,
            "uint16" | "H" | "u2" => Self::UInt16,
            "uint32" | "I" | "u4" => Self::UInt32,
            "uint64" | "L" | "u8" => Self::UInt64,
            "float32" | "f" | "f4" => Self::Float32,
            "float64" | "d" | "f8" => Self::Float64,
            other => return Err(ParseAttributeTypeError(other.to_string())),
        };
        Ok(ty)
    }
}

/// The value of one attribute slot, tagged with its type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttrValue {
    /// Signed 8-bit integer.
    Int8(i8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 8-bit integer.
    UInt8(u8),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
}

enum Numeric {
    Int(i128),
    Float(f64),
}

impl AttrValue {
    /// The type tag of this value.
    pub fn attr_type(self) -> AttributeType {
        match self {
            Self::Int8(_) => AttributeType::Int8,
            Self::Int16(_) => AttributeType::Int16,
            Self::Int32(_) => AttributeType::Int32,
            Self::Int64(_) => AttributeType::Int64,
            Self::UInt8(_) => AttributeType::UInt8,
            Self::UInt16(_) => AttributeType::UInt16,
            Self::UInt32(_) => AttributeType::UInt32,
            Self::UInt64(_) => AttributeType::UInt64,
            Self::Float32(_) => AttributeType::Float32,
            Self::Float64(_) => AttributeType::Float64,
        }
    }

    fn numeric(self) -> Numeric {
        match self {
            Self::Int8(v) => Numeric::Int(v.into()),
            Self::Int16(v) => Numeric::Int(v.into()),
            Self::Int32(v) => Numeric::Int(v.into()),
            Self::Int64(v) => Numeric::Int(v.into()),
            Self::UInt8(v) => Numeric::Int(v.into()),
            Self::UInt16(v) => Numeric::Int(v.into()),
            Self::UInt32(v) => Numeric::Int(v.into()),
            Self::UInt64(v) => Numeric::Int(v.into()),
            Self::Float32(v) => Numeric::Float(v.into()),
            Self::Float64(v) => Numeric::Float(v),
        }
    }

    /// Convert this value to `ty` without losing information.
    ///
    /// Integers convert to any integer type whose range holds them and to
    /// a float type that represents them exactly. Floats convert only to
    /// float types, and only when the value survives the conversion
    /// unchanged (NaN and infinities are preserved). Returns `None` when
    /// the value cannot be represented.
    pub fn convert_to(self, ty: AttributeType) -> Option<AttrValue> {
        match (self.numeric(), ty) {
            (Numeric::Int(v), AttributeType::Int8) => i8::try_from(v).ok().map(Self::Int8),
            (Numeric::Int(v), AttributeType::Int16) => i16::try_from(v).ok().map(Self::Int16),
            (Numeric::Int(v), AttributeType::Int32) => i32::try_from(v).ok().map(Self::Int32),
            (Numeric::Int(v), AttributeType::Int64) => i64::try_from(v).ok().map(Self::Int64),
            (Numeric::Int(v), AttributeType::UInt8) => u8::try_from(v).ok().map(Self::UInt8),
            (Numeric::Int(v), AttributeType::UInt16) => u16::try_from(v).ok().map(Self::UInt16),
            (Numeric::Int(v), AttributeType::UInt32) => u32::try_from(v).ok().map(Self::UInt32),
            (Numeric::Int(v), AttributeType::UInt64) => u64::try_from(v).ok().map(Self::UInt64),
            (Numeric::Int(v), AttributeType::Float32) => {
                let f = v as f32;
                (f as i128 == v).then_some(Self::Float32(f))
            }
            (Numeric::Int(v), AttributeType::Float64) => {
                let f = v as f64;
                (f as i128 == v).then_some(Self::Float64(f))
            }
            (Numeric::Float(f), AttributeType::Float64) => Some(Self::Float64(f)),
            (Numeric::Float(f), AttributeType::Float32) => {
                if f.is_nan() {
                    return Some(Self::Float32(f32::NAN));
                }
                let narrowed = f as f32;
                (f64::from(narrowed) == f).then_some(Self::Float32(narrowed))
            }
            (Numeric::Float(_), _) => None,
        }
    }

    /// Widen to `f64` for feature extraction. Lossy for 64-bit integers
    /// beyond 2^53.
    pub fn to_f64(self) -> f64 {
        match self.numeric() {
            Numeric::Int(v) => v as f64,
            Numeric::Float(f) => f,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
        }
    }
}

/// A Rust primitive that can be stored in an attribute.
///
/// Links each primitive to its [`AttributeType`] and provides typed reads
/// through `TryFrom<AttrValue>` (lossless, see [`AttrValue::convert_to`]).
pub trait AttrPrimitive:
    Copy + Default + Into<AttrValue> + TryFrom<AttrValue, Error = AttrValue> + 'static
{
    /// The attribute type this primitive is stored as.
    const TYPE: AttributeType;
}

macro_rules! primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for AttrValue {
                fn from(v: $t) -> Self {
                    Self::$variant(v)
                }
            }

            impl TryFrom<AttrValue> for $t {
                type Error = AttrValue;

                fn try_from(value: AttrValue) -> Result<Self, Self::Error> {
                    match value.convert_to(AttributeType::$variant) {
                        Some(AttrValue::$variant(v)) => Ok(v),
                        _ => Err(value),
                    }
                }
            }

            impl AttrPrimitive for $t {
                const TYPE: AttributeType = AttributeType::$variant;
            }
        )*
    };
}

primitive! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn widths_match_rust_primitives() {
        assert_eq!(AttributeType::Int8.width(), std::mem::size_of::<i8>());
        assert_eq!(AttributeType::UInt16.width(), std::mem::size_of::<u16>());
        assert_eq!(AttributeType::Float32.width(), std::mem::size_of::<f32>());
        assert_eq!(AttributeType::UInt64.width(), std::mem::size_of::<u64>());
    }

    #[test]
    fn zero_has_matching_type() {
        for ty in AttributeType::ALL {
            assert_eq!(ty.zero().attr_type(), ty);
            assert_eq!(ty.zero().to_f64(), 0.0);
        }
    }

    #[test]
    fn parse_short_codes() {
        assert_eq!("i".parse::<AttributeType>(), Ok(AttributeType::Int32));
        assert_eq!("i2".parse::<AttributeType>(), Ok(AttributeType::Int16));
        assert_eq!("i8".parse::<AttributeType>(), Ok(AttributeType::Int64));
        assert_eq!("f".parse::<AttributeType>(), Ok(AttributeType::Float32));
        assert_eq!("d".parse::<AttributeType>(), Ok(AttributeType::Float64));
        assert_eq!("B".parse::<AttributeType>(), Ok(AttributeType::UInt8));
        assert_eq!("b".parse::<AttributeType>(), Ok(AttributeType::Int8));
        assert!("q".parse::<AttributeType>().is_err());
    }

    #[test]
    fn canonical_names_round_trip() {
        for ty in AttributeType::ALL {
            assert_eq!(ty.name().parse::<AttributeType>(), Ok(ty));
        }
    }

    #[test]
    fn float_never_converts_to_integer() {
        for ty in AttributeType::ALL.into_iter().filter(|t| !t.is_float()) {
            assert_eq!(AttrValue::Float64(1.0).convert_to(ty), None);
            assert_eq!(AttrValue::Float32(0.0).convert_to(ty), None);
        }
    }

    #[test]
    fn out_of_range_integer_rejected() {
        assert_eq!(AttrValue::Int32(300).convert_to(AttributeType::Int8), None);
        assert_eq!(AttrValue::Int32(-1).convert_to(AttributeType::UInt32), None);
        assert_eq!(
            AttrValue::UInt64(u64::MAX).convert_to(AttributeType::Int64),
            None
        );
    }

    #[test]
    fn inexact_float_narrowing_rejected() {
        assert_eq!(AttrValue::Float64(0.1).convert_to(AttributeType::Float32), None);
        assert_eq!(
            AttrValue::Float64(0.5).convert_to(AttributeType::Float32),
            Some(AttrValue::Float32(0.5))
        );
        assert_eq!(
            AttrValue::Float64(f64::INFINITY).convert_to(AttributeType::Float32),
            Some(AttrValue::Float32(f32::INFINITY))
        );
    }

    #[test]
    fn nan_is_preserved() {
        let converted = AttrValue::Float64(f64::NAN)
            .convert_to(AttributeType::Float32)
            .unwrap();
        assert!(matches!(converted, AttrValue::Float32(v) if v.is_nan()));
    }

    #[test]
    fn large_integer_not_exact_in_f64_rejected() {
        let v = AttrValue::Int64((1i64 << 53) + 1);
        assert_eq!(v.convert_to(AttributeType::Float64), None);
        let exact = AttrValue::Int64(1i64 << 53);
        assert!(exact.convert_to(AttributeType::Float64).is_some());
    }

    #[test]
    fn typed_read_through_try_from() {
        assert_eq!(i64::try_from(AttrValue::Int32(-7)), Ok(-7i64));
        assert_eq!(u8::try_from(AttrValue::Int16(256)), Err(AttrValue::Int16(256)));
        assert_eq!(f64::try_from(AttrValue::Float32(1.5)), Ok(1.5f64));
    }

    proptest! {
        #[test]
        fn i32_widens_to_every_wider_signed_type(v in any::<i32>()) {
            let value = AttrValue::from(v);
            prop_assert_eq!(value.convert_to(AttributeType::Int64), Some(AttrValue::Int64(v.into())));
            prop_assert_eq!(value.convert_to(AttributeType::Float64), Some(AttrValue::Float64(v.into())));
        }

        #[test]
        fn conversion_to_own_type_is_identity(v in any::<i16>(), f in -1.0e6f32..1.0e6) {
            let iv = AttrValue::from(v);
            prop_assert_eq!(iv.convert_to(iv.attr_type()), Some(iv));
            let fv = AttrValue::from(f);
            prop_assert_eq!(fv.convert_to(fv.attr_type()), Some(fv));
        }

        #[test]
        fn accepted_conversions_preserve_numeric_value(v in any::<i64>(), ty_idx in 0usize..10) {
            let ty = AttributeType::ALL[ty_idx];
            if let Some(converted) = AttrValue::from(v).convert_to(ty) {
                prop_assert_eq!(converted.attr_type(), ty);
                prop_assert_eq!(converted.to_f64(), v as f64);
            }
        }
    }
}
