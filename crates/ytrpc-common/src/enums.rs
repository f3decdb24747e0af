//! Closed option enums with stable wire encodings.
//!
//! Each enum carries a fixed `VARIANTS` table. Encoding is a match on the
//! variant, decoding is a scan of the table; both are read-only and shared by
//! every thread. Wire names and protocol codes must never be renumbered once
//! shipped, so the tables here are the single source of truth.

use crate::protocol::error::{Result, YtError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An enum whose wire form is a string value.
pub trait StringValueEnum: Sized + Copy + 'static {
    /// Name used in error messages.
    const ENUM_NAME: &'static str;
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    fn value(&self) -> &'static str;

    fn from_value(value: &str) -> Result<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.value() == value)
            .ok_or_else(|| YtError::UnknownEnumValue {
                enum_name: Self::ENUM_NAME,
                value: value.to_string(),
            })
    }
}

/// An enum that additionally has a numeric protocol code.
pub trait ProtoEnum: StringValueEnum {
    fn proto_value(&self) -> i32;

    fn from_proto_value(code: i32) -> Result<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.proto_value() == code)
            .ok_or_else(|| YtError::UnknownEnumValue {
                enum_name: Self::ENUM_NAME,
                value: code.to_string(),
            })
    }
}

fn serialize_value<T: StringValueEnum, S: Serializer>(v: &T, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(v.value())
}

fn deserialize_value<'de, T: StringValueEnum, D: Deserializer<'de>>(d: D) -> std::result::Result<T, D::Error> {
    let raw = String::deserialize(d)?;
    T::from_value(&raw).map_err(serde::de::Error::custom)
}

/// Cypress lock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Snapshot,
    Shared,
    Exclusive,
}

impl StringValueEnum for LockMode {
    const ENUM_NAME: &'static str = "LockMode";
    const VARIANTS: &'static [Self] = &[LockMode::Snapshot, LockMode::Shared, LockMode::Exclusive];

    fn value(&self) -> &'static str {
        match self {
            LockMode::Snapshot => "snapshot",
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }
}

impl ProtoEnum for LockMode {
    fn proto_value(&self) -> i32 {
        match self {
            LockMode::Snapshot => 1,
            LockMode::Shared => 2,
            LockMode::Exclusive => 3,
        }
    }
}

/// Merge operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeMode {
    Unordered,
    Ordered,
    Sorted,
}

impl StringValueEnum for MergeMode {
    const ENUM_NAME: &'static str = "MergeMode";
    const VARIANTS: &'static [Self] = &[MergeMode::Unordered, MergeMode::Ordered, MergeMode::Sorted];

    fn value(&self) -> &'static str {
        match self {
            MergeMode::Unordered => "unordered",
            MergeMode::Ordered => "ordered",
            MergeMode::Sorted => "sorted",
        }
    }
}

/// Comparison relation of a key bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relation {
    #[default]
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl StringValueEnum for Relation {
    const ENUM_NAME: &'static str = "Relation";
    const VARIANTS: &'static [Self] = &[
        Relation::Less,
        Relation::LessOrEqual,
        Relation::Greater,
        Relation::GreaterOrEqual,
    ];

    fn value(&self) -> &'static str {
        match self {
            Relation::Less => "<",
            Relation::LessOrEqual => "<=",
            Relation::Greater => ">",
            Relation::GreaterOrEqual => ">=",
        }
    }
}

macro_rules! string_value_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.value())
            }
        }

        impl FromStr for $ty {
            type Err = YtError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_value(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                serialize_value(self, s)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                deserialize_value(d)
            }
        }
    )*};
}

string_value_impls!(LockMode, MergeMode, Relation);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_mode_names_round_trip() {
        for mode in LockMode::VARIANTS {
            assert_eq!(LockMode::from_value(mode.value()).unwrap(), *mode);
        }
    }

    #[test]
    fn test_lock_mode_codes_round_trip() {
        for mode in LockMode::VARIANTS {
            assert_eq!(LockMode::from_proto_value(mode.proto_value()).unwrap(), *mode);
        }
    }

    #[test]
    fn test_lock_mode_codes_are_stable() {
        assert_eq!(LockMode::Snapshot.proto_value(), 1);
        assert_eq!(LockMode::Shared.proto_value(), 2);
        assert_eq!(LockMode::Exclusive.proto_value(), 3);
        assert_eq!(LockMode::Exclusive.value(), "exclusive");
    }

    #[test]
    fn test_unknown_lock_code_is_rejected() {
        let err = LockMode::from_proto_value(0).unwrap_err();
        match err {
            YtError::UnknownEnumValue { enum_name, value } => {
                assert_eq!(enum_name, "LockMode");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_merge_mode_is_rejected() {
        assert!(matches!(
            "shuffled".parse::<MergeMode>(),
            Err(YtError::UnknownEnumValue { enum_name: "MergeMode", .. })
        ));
    }

    #[test]
    fn test_merge_mode_names_round_trip() {
        for mode in MergeMode::VARIANTS {
            assert_eq!(mode.to_string().parse::<MergeMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn test_relation_default_is_less() {
        assert_eq!(Relation::default(), Relation::Less);
        assert_eq!(Relation::GreaterOrEqual.value(), ">=");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_value(LockMode::Shared).unwrap(), "shared");
        let mode: MergeMode = serde_json::from_str("\"sorted\"").unwrap();
        assert_eq!(mode, MergeMode::Sorted);
        assert!(serde_json::from_str::<Relation>("\"<>\"").is_err());
    }
}
