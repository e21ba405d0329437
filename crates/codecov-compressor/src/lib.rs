//! Compression for upload payloads.
//!
//! The coverage bundle goes to storage as a gzip stream at level 9. Test-result
//! artifacts are zlib streams at the default level before they are base64
//! encoded.

use flate2::Compression;
use flate2::write::{GzDecoder, GzEncoder, ZlibDecoder, ZlibEncoder};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Compression algorithm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    #[default]
    Gzip,
    Zlib,
    None,
}

/// Compression configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionConfig {
    #[serde(default)]
    pub algorithm: CompressionAlgorithm,
    /// Compression level (0-9)
    #[serde(default = "default_compression_level")]
    pub level: u32,
}

fn default_compression_level() -> u32 {
    6
}

impl CompressionConfig {
    /// gzip at maximum level, as expected by the coverage storage PUT.
    pub fn coverage_payload() -> Self {
        Self {
            algorithm: CompressionAlgorithm::Gzip,
            level: 9,
        }
    }

    /// zlib at the default level, used for test-result artifacts.
    pub fn test_results() -> Self {
        Self {
            algorithm: CompressionAlgorithm::Zlib,
            level: default_compression_level(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::coverage_payload()
    }
}

/// Compressor for encoding data
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress data using the configured algorithm
    pub fn compress(&self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let level = Compression::new(self.config.level.min(9));
        match self.config.algorithm {
            CompressionAlgorithm::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder
                    .finish()
                    .map_err(|e| anyhow::anyhow!("gzip compression failed: {}", e))
            }
            CompressionAlgorithm::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder
                    .finish()
                    .map_err(|e| anyhow::anyhow!("zlib compression failed: {}", e))
            }
            CompressionAlgorithm::None => Ok(data.to_vec()),
        }
    }

    /// Decompress data using the configured algorithm
    pub fn decompress(&self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        match self.config.algorithm {
            CompressionAlgorithm::Gzip => {
                let mut decoder = GzDecoder::new(Vec::new());
                decoder.write_all(data)?;
                decoder
                    .finish()
                    .map_err(|e| anyhow::anyhow!("gzip decompression failed: {}", e))
            }
            CompressionAlgorithm::Zlib => {
                let mut decoder = ZlibDecoder::new(Vec::new());
                decoder.write_all(data)?;
                decoder
                    .finish()
                    .map_err(|e| anyhow::anyhow!("zlib decompression failed: {}", e))
            }
            CompressionAlgorithm::None => Ok(data.to_vec()),
        }
    }

    /// Compress and report the sizes before and after.
    pub fn compress_with_stats(&self, data: &[u8]) -> anyhow::Result<(Vec<u8>, CompressionStats)> {
        let compressed = self.compress(data)?;
        let stats = CompressionStats {
            original_size: data.len(),
            compressed_size: compressed.len(),
        };
        Ok((compressed, stats))
    }
}

/// Compression statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressionStats {
    /// Calculate compression ratio
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.compressed_size as f64 / self.original_size as f64
    }

    /// Calculate space savings percentage
    pub fn savings_percent(&self) -> f64 {
        (1.0 - self.ratio()) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_payload_is_gzip_level_nine() {
        let config = CompressionConfig::coverage_payload();
        assert_eq!(config.algorithm, CompressionAlgorithm::Gzip);
        assert_eq!(config.level, 9);
        assert_eq!(CompressionConfig::default(), config);
    }

    #[test]
    fn gzip_compression() -> anyhow::Result<()> {
        let compressor = Compressor::new(CompressionConfig::coverage_payload());
        let original = b"<<<<<< network\n# path=./coverage.xml\n<coverage/>\n<<<<<< EOF".repeat(10);

        let compressed = compressor.compress(&original)?;
        // gzip magic
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
        assert!(compressed.len() < original.len());

        let decompressed = compressor.decompress(&compressed)?;
        assert_eq!(original.as_slice(), decompressed.as_slice());
        Ok(())
    }

    #[test]
    fn zlib_compression() -> anyhow::Result<()> {
        let compressor = Compressor::new(CompressionConfig::test_results());
        let original = b"<testsuites><testsuite name=\"a\"/></testsuites>";

        let compressed = compressor.compress(original)?;
        // zlib header, default compression
        assert_eq!(compressed[0], 0x78);

        let decompressed = compressor.decompress(&compressed)?;
        assert_eq!(original.as_slice(), decompressed.as_slice());
        Ok(())
    }

    #[test]
    fn no_compression() -> anyhow::Result<()> {
        let compressor = Compressor::new(CompressionConfig {
            algorithm: CompressionAlgorithm::None,
            level: 6,
        });
        let original = b"Test data";

        assert_eq!(compressor.compress(original)?, original.to_vec());
        assert_eq!(compressor.decompress(original)?, original.to_vec());
        Ok(())
    }

    #[test]
    fn empty_input_round_trips() -> anyhow::Result<()> {
        let compressor = Compressor::new(CompressionConfig::coverage_payload());
        let compressed = compressor.compress(b"")?;
        assert!(!compressed.is_empty());
        assert!(compressor.decompress(&compressed)?.is_empty());
        Ok(())
    }

    #[test]
    fn garbage_fails_to_decompress() {
        let compressor = Compressor::new(CompressionConfig::coverage_payload());
        assert!(compressor.decompress(b"definitely not gzip").is_err());
    }

    #[test]
    fn compression_stats() {
        let stats = CompressionStats {
            original_size: 100,
            compressed_size: 50,
        };

        assert_eq!(stats.ratio(), 0.5);
        assert_eq!(stats.savings_percent(), 50.0);
        assert_eq!(CompressionStats::default().ratio(), 1.0);
    }

    #[test]
    fn stats_match_output() -> anyhow::Result<()> {
        let compressor = Compressor::new(CompressionConfig::coverage_payload());
        let data = b"abc".repeat(100);
        let (compressed, stats) = compressor.compress_with_stats(&data)?;
        assert_eq!(stats.original_size, 300);
        assert_eq!(stats.compressed_size, compressed.len());
        Ok(())
    }

    #[test]
    fn algorithm_serde_is_lowercase() -> anyhow::Result<()> {
        let json = serde_json::to_string(&CompressionConfig::test_results())?;
        assert_eq!(json, r#"{"algorithm":"zlib","level":6}"#);
        let parsed: CompressionConfig = serde_json::from_str("{}")?;
        assert_eq!(parsed.algorithm, CompressionAlgorithm::Gzip);
        assert_eq!(parsed.level, 6);
        Ok(())
    }
}
