//! The `gzip` codec.
//!
//! Applies gzip compression (RFC 1952) with a compression level from 0 to 9.

use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{metadata::CompressorMetadata, plugin::PluginCreateError};

use super::{
    configuration_from_metadata, metadata_from_configuration, CodecError, CodecPlugin,
    Compressor, CompressorTraits,
};

const IDENTIFIER: &str = "gzip";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_gzip, create_codec_gzip)
}

fn is_name_gzip(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_gzip(metadata: &CompressorMetadata) -> Result<Compressor, PluginCreateError> {
    let configuration: GzipCodecConfiguration = configuration_from_metadata(IDENTIFIER, metadata)?;
    Ok(Compressor::new(GzipCodec::new_with_configuration(
        &configuration,
    )))
}

/// A deflate compression level, an integer from 0 to 9.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
#[serde(try_from = "u32", into = "u32")]
pub struct DeflateCompressionLevel(u32);

/// An invalid deflate compression level error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid compression level {0}, must be 0-9")]
pub struct DeflateCompressionLevelError(u32);

impl TryFrom<u32> for DeflateCompressionLevel {
    type Error = DeflateCompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(DeflateCompressionLevelError(level))
        }
    }
}

impl From<DeflateCompressionLevel> for u32 {
    fn from(level: DeflateCompressionLevel) -> Self {
        level.0
    }
}

impl DeflateCompressionLevel {
    /// Returns the compression level as a [`flate2::Compression`].
    #[must_use]
    pub fn as_compression(&self) -> flate2::Compression {
        flate2::Compression::new(self.0)
    }
}

/// Configuration parameters for the `gzip` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct GzipCodecConfiguration {
    /// The compression level.
    pub level: DeflateCompressionLevel,
}

/// A `gzip` codec implementation.
#[derive(Clone, Debug)]
pub struct GzipCodec {
    compression_level: DeflateCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`DeflateCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, DeflateCompressionLevelError> {
        let compression_level = compression_level.try_into()?;
        Ok(Self { compression_level })
    }

    /// Create a new `gzip` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &GzipCodecConfiguration) -> Self {
        Self {
            compression_level: configuration.level,
        }
    }
}

impl CompressorTraits for GzipCodec {
    fn create_metadata(&self) -> CompressorMetadata {
        let configuration = GzipCodecConfiguration {
            level: self.compression_level,
        };
        metadata_from_configuration(IDENTIFIER, &configuration)
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            self.compression_level.as_compression(),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|err| CodecError::CorruptData(err.to_string()))?;
        Ok(out)
    }
}
