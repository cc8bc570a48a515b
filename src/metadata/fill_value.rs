use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Fill value metadata.
///
/// Shared by both metadata generations.
/// Non-finite floating point values are encoded as the strings `"NaN"`, `"Infinity"`, and `"-Infinity"`.
#[derive(Clone, PartialEq, Debug, Display)]
pub enum FillValueMetadata {
    /// No fill value.
    #[display("null")]
    Null,
    /// A boolean.
    #[display("{_0}")]
    Bool(bool),
    /// NaN (not-a-number).
    #[display("NaN")]
    NaN,
    /// Positive infinity.
    #[display("Infinity")]
    Infinity,
    /// Negative infinity.
    #[display("-Infinity")]
    NegInfinity,
    /// A number.
    #[display("{_0}")]
    Number(serde_json::Number),
}

impl<'de> serde::Deserialize<'de> for FillValueMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataType {
            String(String),
            Bool(bool),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataType::deserialize(d)?;
        match fill_value {
            FillValueMetadataType::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Err(serde::de::Error::custom(format!(
                    "unsupported fill value {string}"
                ))),
            },
            FillValueMetadataType::Bool(value) => Ok(Self::Bool(value)),
            FillValueMetadataType::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataType::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadata {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
        }
    }
}

impl From<bool> for FillValueMetadata {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FillValueMetadata {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FillValueMetadata {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FillValueMetadata {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::NaN
        } else if value == f64::INFINITY {
            Self::Infinity
        } else if value == f64::NEG_INFINITY {
            Self::NegInfinity
        } else {
            serde_json::Number::from_f64(value).map_or(Self::NaN, Self::Number)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value_metadata_serde() {
        for (json, fill_value) in [
            ("null", FillValueMetadata::Null),
            ("true", FillValueMetadata::Bool(true)),
            ("\"NaN\"", FillValueMetadata::NaN),
            ("\"Infinity\"", FillValueMetadata::Infinity),
            ("\"-Infinity\"", FillValueMetadata::NegInfinity),
            ("6.6", FillValueMetadata::from(6.6)),
            ("-3", FillValueMetadata::from(-3i64)),
        ] {
            assert_eq!(
                serde_json::from_str::<FillValueMetadata>(json).unwrap(),
                fill_value
            );
            assert_eq!(serde_json::to_string(&fill_value).unwrap(), json);
        }
        assert!(serde_json::from_str::<FillValueMetadata>("\"nan\"").is_err());
        assert!(serde_json::from_str::<FillValueMetadata>("[0]").is_err());
    }

    #[test]
    fn fill_value_metadata_display() {
        assert_eq!(FillValueMetadata::from(6.6).to_string(), "6.6");
        assert_eq!(FillValueMetadata::NegInfinity.to_string(), "-Infinity");
        assert_eq!(FillValueMetadata::Null.to_string(), "null");
    }
}
