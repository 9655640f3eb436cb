//! Built-in compression algorithms

use crate::{CodecError, CompressionOptions, Result};
#[cfg(feature = "gzip")]
use std::io::Write;
use std::str::FromStr;

/// Built-in compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAlgorithm {
    /// Gzip container around deflate
    Gzip,

    /// Zlib-wrapped deflate stream
    Deflate,

    /// Raw deflate stream without header or checksum
    DeflateRaw,

    /// Brotli (best ratio for text)
    Brotli,

    /// Zstandard
    Zstd,
}

impl BuiltinAlgorithm {
    /// All built-in algorithms
    pub const ALL: [BuiltinAlgorithm; 5] = [
        Self::Gzip,
        Self::Deflate,
        Self::DeflateRaw,
        Self::Brotli,
        Self::Zstd,
    ];

    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::DeflateRaw => "deflateRaw",
            Self::Brotli => "brotliCompress",
            Self::Zstd => "zstd",
        }
    }

    /// Label recorded in an original asset's relation map
    pub fn relation_label(&self) -> &'static str {
        match self {
            Self::Gzip => "gzipped",
            Self::Deflate => "deflated",
            Self::DeflateRaw => "deflatedRaw",
            Self::Brotli => "brotliCompressed",
            Self::Zstd => "zstdCompressed",
        }
    }

    /// Extension used by the default filename template
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Brotli => "br",
            Self::Zstd => "zst",
            Self::Gzip | Self::Deflate | Self::DeflateRaw => "gz",
        }
    }

    /// Check if this algorithm is available (feature enabled)
    pub fn is_available(&self) -> bool {
        match self {
            Self::Gzip | Self::Deflate | Self::DeflateRaw => cfg!(feature = "gzip"),
            Self::Brotli => cfg!(feature = "brotli"),
            Self::Zstd => cfg!(feature = "zstd"),
        }
    }

    /// Default options merged underneath user options.
    ///
    /// Every codec defaults to its strongest setting since output is
    /// produced once per build and served many times.
    pub fn default_options(&self) -> CompressionOptions {
        match self {
            Self::Gzip | Self::Deflate | Self::DeflateRaw => {
                CompressionOptions::new().with("level", 9)
            }
            Self::Brotli => CompressionOptions::new()
                .with("quality", 11)
                .with("lgwin", 22),
            Self::Zstd => CompressionOptions::new().with("level", 19),
        }
    }

    /// Validate merged options and extract the settings the backend needs
    pub fn settings(&self, options: &CompressionOptions) -> Result<CodecSettings> {
        let settings = match self {
            Self::Gzip | Self::Deflate | Self::DeflateRaw => CodecSettings {
                level: options.get_u32_in("level", 0, 9)?.unwrap_or(9),
                window: None,
            },
            Self::Brotli => CodecSettings {
                level: options.get_u32_in("quality", 0, 11)?.unwrap_or(11),
                window: options.get_u32_in("lgwin", 10, 24)?,
            },
            Self::Zstd => CodecSettings {
                level: options.get_u32_in("level", 1, 22)?.unwrap_or(19),
                window: None,
            },
        };

        Ok(settings)
    }

    /// Compress data using this algorithm
    pub fn compress(&self, data: &[u8], settings: CodecSettings) -> Result<Vec<u8>> {
        match self {
            #[cfg(feature = "gzip")]
            Self::Gzip => compress_gzip(data, settings.level),
            #[cfg(feature = "gzip")]
            Self::Deflate => compress_zlib(data, settings.level),
            #[cfg(feature = "gzip")]
            Self::DeflateRaw => compress_deflate_raw(data, settings.level),
            #[cfg(feature = "brotli")]
            Self::Brotli => compress_brotli(data, settings.level, settings.window),
            #[cfg(feature = "zstd")]
            Self::Zstd => compress_zstd(data, settings.level),
            #[allow(unreachable_patterns)]
            _ => {
                let _ = (data, settings);
                Err(CodecError::UnsupportedAlgorithm(self.name().to_string()))
            }
        }
    }
}

impl FromStr for BuiltinAlgorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gzip" => Ok(Self::Gzip),
            "deflate" => Ok(Self::Deflate),
            "deflateRaw" | "deflate-raw" => Ok(Self::DeflateRaw),
            "brotliCompress" | "brotli" | "br" => Ok(Self::Brotli),
            "zstd" => Ok(Self::Zstd),
            other => Err(CodecError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for BuiltinAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend parameters extracted from a merged option map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSettings {
    /// Compression level (quality for brotli)
    pub level: u32,
    /// Window size exponent, where the backend supports one
    pub window: Option<u32>,
}

// ========== Deflate family ==========

#[cfg(feature = "gzip")]
fn compress_gzip(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

#[cfg(feature = "gzip")]
fn compress_zlib(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

#[cfg(feature = "gzip")]
fn compress_deflate_raw(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::DeflateEncoder;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}

// ========== Brotli ==========

#[cfg(feature = "brotli")]
fn compress_brotli(data: &[u8], quality: u32, lgwin: Option<u32>) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut params = brotli::enc::BrotliEncoderParams {
        quality: quality as i32,
        ..Default::default()
    };
    if let Some(lgwin) = lgwin {
        params.lgwin = lgwin as i32;
    }

    let mut reader = std::io::Cursor::new(data);
    brotli::BrotliCompress(&mut reader, &mut output, &params)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;

    Ok(output)
}

// ========== Zstd ==========

#[cfg(feature = "zstd")]
fn compress_zstd(data: &[u8], level: u32) -> Result<Vec<u8>> {
    zstd::encode_all(std::io::Cursor::new(data), level as i32)
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))
}
