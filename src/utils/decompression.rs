use anyhow::Result;
use bytes::Bytes;

/// Compression formats recognised in mirror responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Uncompressed,
}

/// Magic byte detection and decompression for playlist bodies
///
/// Some mirrors serve a gzip file as-is without a `Content-Encoding` header,
/// so the transport layer never decodes it for us.
pub struct DecompressionService;

impl DecompressionService {
    pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
        match infer::get(data) {
            Some(kind) if kind.mime_type() == "application/gzip" => CompressionFormat::Gzip,
            _ => CompressionFormat::Uncompressed,
        }
    }

    /// Decompress data based on its detected format
    pub fn decompress(data: Bytes) -> Result<Vec<u8>> {
        match Self::detect_compression_format(&data) {
            CompressionFormat::Gzip => Self::decompress_gzip(data),
            CompressionFormat::Uncompressed => Ok(data.to_vec()),
        }
    }

    #[cfg(feature = "compression-gzip")]
    fn decompress_gzip(data: Bytes) -> Result<Vec<u8>> {
        use anyhow::Context;
        use flate2::read::GzDecoder;
        use std::io::Read;

        let mut decoder = GzDecoder::new(data.as_ref());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("Failed to decompress gzip data")?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-gzip"))]
    fn decompress_gzip(_data: Bytes) -> Result<Vec<u8>> {
        anyhow::bail!("gzip content received but the compression-gzip feature is disabled")
    }
}
