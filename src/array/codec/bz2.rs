//! The `bz2` codec.
//!
//! Applies bzip2 compression with a block size level from 1 to 9.

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{metadata::CompressorMetadata, plugin::PluginCreateError};

use super::{
    configuration_from_metadata, metadata_from_configuration, CodecError, CodecPlugin,
    Compressor, CompressorTraits,
};

const IDENTIFIER: &str = "bz2";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_bz2, create_codec_bz2)
}

fn is_name_bz2(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_bz2(metadata: &CompressorMetadata) -> Result<Compressor, PluginCreateError> {
    let configuration: Bz2CodecConfiguration = configuration_from_metadata(IDENTIFIER, metadata)?;
    Ok(Compressor::new(Bz2Codec {
        level: configuration.level,
    }))
}

/// A bzip2 compression level, an integer from 1 to 9.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
#[serde(try_from = "u32", into = "u32")]
pub struct Bz2CompressionLevel(u32);

/// An invalid bzip2 compression level error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid compression level {0}, must be 1-9")]
pub struct Bz2CompressionLevelError(u32);

impl TryFrom<u32> for Bz2CompressionLevel {
    type Error = Bz2CompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Bz2CompressionLevelError(level))
        }
    }
}

impl From<Bz2CompressionLevel> for u32 {
    fn from(level: Bz2CompressionLevel) -> Self {
        level.0
    }
}

/// Configuration parameters for the `bz2` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct Bz2CodecConfiguration {
    /// The compression level.
    pub level: Bz2CompressionLevel,
}

/// A `bz2` codec implementation.
#[derive(Clone, Debug)]
pub struct Bz2Codec {
    level: Bz2CompressionLevel,
}

impl Bz2Codec {
    /// Create a new `bz2` codec.
    ///
    /// # Errors
    /// Returns [`Bz2CompressionLevelError`] if `level` is not valid.
    pub fn new(level: u32) -> Result<Self, Bz2CompressionLevelError> {
        Ok(Self {
            level: level.try_into()?,
        })
    }
}

impl CompressorTraits for Bz2Codec {
    fn create_metadata(&self) -> CompressorMetadata {
        let configuration = Bz2CodecConfiguration { level: self.level };
        metadata_from_configuration(IDENTIFIER, &configuration)
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = bzip2::read::BzEncoder::new(
            decoded_value.as_slice(),
            bzip2::Compression::new(self.level.0),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = bzip2::read::BzDecoder::new(encoded_value.as_slice());
        let mut out: Vec<u8> = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|err| CodecError::CorruptData(err.to_string()))?;
        Ok(out)
    }
}
