//! The `zlib` codec.
//!
//! Applies zlib compression (RFC 1950) with a compression level from 0 to 9.

use std::io::{Cursor, Read};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::{metadata::CompressorMetadata, plugin::PluginCreateError};

use super::{
    configuration_from_metadata,
    gzip::{DeflateCompressionLevel, DeflateCompressionLevelError},
    metadata_from_configuration, CodecError, CodecPlugin, Compressor, CompressorTraits,
};

const IDENTIFIER: &str = "zlib";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zlib, create_codec_zlib)
}

fn is_name_zlib(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_zlib(metadata: &CompressorMetadata) -> Result<Compressor, PluginCreateError> {
    let configuration: ZlibCodecConfiguration = configuration_from_metadata(IDENTIFIER, metadata)?;
    Ok(Compressor::new(ZlibCodec {
        compression_level: configuration.level,
    }))
}

/// Configuration parameters for the `zlib` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct ZlibCodecConfiguration {
    /// The compression level.
    pub level: DeflateCompressionLevel,
}

/// A `zlib` codec implementation.
#[derive(Clone, Debug)]
pub struct ZlibCodec {
    compression_level: DeflateCompressionLevel,
}

impl ZlibCodec {
    /// Create a new `zlib` codec.
    ///
    /// # Errors
    /// Returns [`DeflateCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, DeflateCompressionLevelError> {
        let compression_level = compression_level.try_into()?;
        Ok(Self { compression_level })
    }
}

impl CompressorTraits for ZlibCodec {
    fn create_metadata(&self) -> CompressorMetadata {
        let configuration = ZlibCodecConfiguration {
            level: self.compression_level,
        };
        metadata_from_configuration(IDENTIFIER, &configuration)
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(
            Cursor::new(decoded_value),
            self.compression_level.as_compression(),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|err| CodecError::CorruptData(err.to_string()))?;
        Ok(out)
    }
}
