//! The `identity` codec, which stores bytes unchanged.

use crate::{metadata::CompressorMetadata, plugin::PluginCreateError};

use super::{CodecError, CodecPlugin, Compressor, CompressorTraits};

const IDENTIFIER: &str = "identity";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_identity, create_codec_identity)
}

fn is_name_identity(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

#[allow(clippy::unnecessary_wraps)]
fn create_codec_identity(_metadata: &CompressorMetadata) -> Result<Compressor, PluginCreateError> {
    Ok(Compressor::new(IdentityCodec))
}

/// An `identity` codec implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityCodec;

impl CompressorTraits for IdentityCodec {
    fn create_metadata(&self) -> CompressorMetadata {
        CompressorMetadata::new(IDENTIFIER, serde_json::Map::new())
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(decoded_value)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(encoded_value)
    }
}
