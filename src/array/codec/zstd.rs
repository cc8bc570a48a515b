//! The `zstd` codec.
//!
//! Applies Zstandard compression with an optional content checksum.

use std::io::Write;

use serde::{Deserialize, Serialize};
use zstd::zstd_safe;

use crate::{metadata::CompressorMetadata, plugin::PluginCreateError};

use super::{
    configuration_from_metadata, metadata_from_configuration, CodecError, CodecPlugin,
    Compressor, CompressorTraits,
};

const IDENTIFIER: &str = "zstd";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zstd, create_codec_zstd)
}

fn is_name_zstd(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_zstd(metadata: &CompressorMetadata) -> Result<Compressor, PluginCreateError> {
    let configuration: ZstdCodecConfiguration = configuration_from_metadata(IDENTIFIER, metadata)?;
    Ok(Compressor::new(ZstdCodec::new_with_configuration(
        &configuration,
    )))
}

/// Configuration parameters for the `zstd` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct ZstdCodecConfiguration {
    /// The compression level.
    pub level: ZstdCompressionLevel,
    /// Whether to store a checksum when writing that will be verified when reading.
    #[serde(default)]
    pub checksum: bool,
}

/// A Zstd compression level. An integer from -131072 to 22 which controls the speed and level of compression (has no impact on decoding).
///
/// A value of 0 indicates to use the default compression level.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug)]
pub struct ZstdCompressionLevel(zstd_safe::CompressionLevel);

impl<'de> serde::Deserialize<'de> for ZstdCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(d)?;
        if let Some(number) = number.as_i64() {
            if (-131_072..=22).contains(&number) {
                #[allow(clippy::cast_possible_truncation)]
                return Ok(Self(number as i32));
            }
        }
        Err(serde::de::Error::custom(
            "zstd compression level must be an integer between -131072 and 22",
        ))
    }
}

/// A `zstd` codec implementation.
#[derive(Clone, Debug)]
pub struct ZstdCodec {
    compression: zstd_safe::CompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub const fn new(compression: zstd_safe::CompressionLevel, checksum: bool) -> Self {
        Self {
            compression,
            checksum,
        }
    }

    /// Create a new `zstd` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        Self {
            compression: configuration.level.0,
            checksum: configuration.checksum,
        }
    }
}

impl CompressorTraits for ZstdCodec {
    fn create_metadata(&self) -> CompressorMetadata {
        let configuration = ZstdCodecConfiguration {
            level: ZstdCompressionLevel(self.compression),
            checksum: self.checksum,
        };
        metadata_from_configuration(IDENTIFIER, &configuration)
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = zstd::Encoder::new(Vec::new(), self.compression)?;
        encoder.include_checksum(self.checksum)?;
        encoder.write_all(&decoded_value)?;
        Ok(encoder.finish()?)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(encoded_value.as_slice())
            .map_err(|err| CodecError::CorruptData(err.to_string()))
    }
}
