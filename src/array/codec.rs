//! The codec registry.
//!
//! A [`Compressor`] is a [`Box`] wrapped compression codec which implements [`CompressorTraits`].
//! Compressors are registered at compile time through [`inventory`] as a [`CodecPlugin`], keyed by codec identifier.
//! A compressor is created from [`CompressorMetadata`] with [`Compressor::from_metadata`], or one-off with [`compress`] and [`decompress`].
//!
//! Codecs:
//!  - `identity`: no compression,
//!  - `gzip` and `zlib` (feature `gzip`),
//!  - `zstd` (feature `zstd`), and
//!  - `bz2` (feature `bz2`).

#[cfg(feature = "bz2")]
pub mod bz2;
#[cfg(feature = "gzip")]
pub mod gzip;
pub mod identity;
#[cfg(feature = "gzip")]
pub mod zlib;
#[cfg(feature = "zstd")]
pub mod zstd;

use derive_more::{Deref, From};
use thiserror::Error;

use crate::{
    metadata::CompressorMetadata,
    plugin::{Plugin, PluginCreateError},
};

/// A compressor.
///
/// Compressors are equal if their [metadata](CompressorTraits::create_metadata) is equal.
#[derive(Debug, Clone, From, Deref)]
pub struct Compressor(Box<dyn CompressorTraits>);

/// A codec plugin.
pub type CodecPlugin = Plugin<Compressor>;
inventory::collect!(CodecPlugin);

impl Compressor {
    /// Create a compressor.
    pub fn new<T: CompressorTraits + 'static>(compressor: T) -> Self {
        let compressor: Box<dyn CompressorTraits> = Box::new(compressor);
        compressor.into()
    }

    /// Create a compressor from metadata.
    ///
    /// # Errors
    /// Returns [`CodecError::UnsupportedCodec`] if the codec identifier is not associated with a registered codec plugin,
    /// or [`CodecError::InvalidConfiguration`] if the parameters are invalid.
    pub fn from_metadata(metadata: &CompressorMetadata) -> Result<Self, CodecError> {
        for plugin in inventory::iter::<CodecPlugin> {
            if plugin.match_name(metadata.id()) {
                return Ok(plugin.create(metadata)?);
            }
        }
        Err(PluginCreateError::Unsupported {
            name: metadata.id().to_string(),
            plugin_type: "codec".to_string(),
        }
        .into())
    }
}

impl PartialEq for Compressor {
    fn eq(&self, other: &Self) -> bool {
        self.create_metadata() == other.create_metadata()
    }
}

/// Compressor traits.
pub trait CompressorTraits: dyn_clone::DynClone + core::fmt::Debug + Send + Sync {
    /// Create the metadata of this compressor, its identifier and parameters.
    fn create_metadata(&self) -> CompressorMetadata;

    /// Encode (compress) bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode (decompress) bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::CorruptData`] if `encoded_value` is not valid compressed data.
    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

dyn_clone::clone_trait_object!(CompressorTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An unsupported codec.
    #[error("codec {0} is not supported")]
    UnsupportedCodec(String),
    /// Invalid codec parameters.
    #[error("invalid codec configuration: {0}")]
    InvalidConfiguration(String),
    /// Encoded data could not be decompressed.
    #[error("corrupt data: {0}")]
    CorruptData(String),
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl From<PluginCreateError> for CodecError {
    fn from(err: PluginCreateError) -> Self {
        match err {
            PluginCreateError::Unsupported { name, .. } => Self::UnsupportedCodec(name),
            PluginCreateError::MetadataInvalid(err) => Self::InvalidConfiguration(err.to_string()),
        }
    }
}

/// Compress `bytes` with the codec described by `metadata`.
///
/// # Errors
/// Returns [`CodecError`] if the codec is unsupported, its parameters are invalid, or compression fails.
pub fn compress(metadata: &CompressorMetadata, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
    Compressor::from_metadata(metadata)?.encode(bytes)
}

/// Decompress `bytes` with the codec described by `metadata`.
///
/// # Errors
/// Returns [`CodecError`] if the codec is unsupported, its parameters are invalid, or `bytes` is corrupt.
pub fn decompress(metadata: &CompressorMetadata, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
    Compressor::from_metadata(metadata)?.decode(bytes)
}

/// Parse the configuration of a codec from metadata.
fn configuration_from_metadata<T: serde::de::DeserializeOwned>(
    identifier: &'static str,
    metadata: &CompressorMetadata,
) -> Result<T, PluginCreateError> {
    metadata.to_configuration().map_err(|_| {
        crate::plugin::PluginMetadataInvalidError::new(identifier, "codec", metadata.clone())
            .into()
    })
}

/// Create [`CompressorMetadata`] from a codec configuration.
fn metadata_from_configuration<T: serde::Serialize>(
    identifier: &str,
    configuration: &T,
) -> CompressorMetadata {
    CompressorMetadata::new_with_serializable_configuration(identifier, configuration)
        .unwrap_or_else(|_| CompressorMetadata::new(identifier, serde_json::Map::new()))
}
