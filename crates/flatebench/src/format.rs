// Dweve Flatebench - Correctness-aware compression benchmarks
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compressed-stream format detection and round-trip validation.
//!
//! Tools under comparison disagree on framing: some emit zlib-wrapped
//! streams, some raw DEFLATE, some gzip. The only reliable way to tell
//! them apart is a trial decode, so [`detect`] tries the decoders in a
//! fixed priority order and the first clean decode wins.
//!
//! Decoding here is strict: a stream only counts as decoded when the
//! decoder reaches the end-of-stream marker and (for the wrapped formats)
//! the trailer checksum matches. Truncated input is a failure, not a
//! shorter result.

use flate2::read::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use std::fmt;
use std::io::Read;

/// Encoding of a compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamFormat {
    /// zlib wrapper (RFC 1950)
    Zlib,
    /// Bare DEFLATE blocks (RFC 1951)
    RawDeflate,
    /// gzip wrapper (RFC 1952)
    Gzip,
    /// None of the above decoded cleanly
    Unknown,
}

impl StreamFormat {
    /// Returns the format tag as printed in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::Zlib => "zlib",
            StreamFormat::RawDeflate => "raw-deflate",
            StreamFormat::Gzip => "gzip",
            StreamFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running a tool once and checking its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioResult {
    /// Detected encoding, `None` when the tool produced no evaluable output.
    pub format: Option<StreamFormat>,
    /// Byte length of the tool's output.
    pub compressed_size: usize,
    /// Whether the output decodes back to the original input exactly.
    pub valid: bool,
    /// Diagnostic, empty when `valid`.
    pub error: String,
}

impl RatioResult {
    /// Result for a tool whose ratio invocation could not produce output.
    pub fn command_failed(reason: impl fmt::Display) -> Self {
        Self {
            format: None,
            compressed_size: 0,
            valid: false,
            error: format!("ratio command failed: {}", reason),
        }
    }

    /// Placeholder for a tool with no recorded ratio result.
    pub fn missing() -> Self {
        Self {
            format: None,
            compressed_size: 0,
            valid: false,
            error: "missing ratio result".to_string(),
        }
    }

    /// Format tag for display; `err` when no output was evaluated.
    pub fn format_label(&self) -> &'static str {
        self.format.map(|f| f.as_str()).unwrap_or("err")
    }
}

/// Determines the encoding of `blob` and decodes it.
///
/// Tries zlib, then raw DEFLATE, then gzip. Returns
/// `(StreamFormat::Unknown, None)` if none of them decode.
///
/// # Example
///
/// ```
/// use flatebench::format::{detect, StreamFormat};
///
/// let (format, decoded) = detect(b"definitely not compressed");
/// assert_eq!(format, StreamFormat::Unknown);
/// assert!(decoded.is_none());
/// ```
pub fn detect(blob: &[u8]) -> (StreamFormat, Option<Vec<u8>>) {
    if let Some(decoded) = inflate(blob, Decompress::new(true)) {
        return (StreamFormat::Zlib, Some(decoded));
    }
    if let Some(decoded) = inflate(blob, Decompress::new(false)) {
        return (StreamFormat::RawDeflate, Some(decoded));
    }
    if let Some(decoded) = gunzip(blob) {
        return (StreamFormat::Gzip, Some(decoded));
    }
    (StreamFormat::Unknown, None)
}

/// Checks a tool's output against the original input.
///
/// `compressed_size` is always `blob.len()`, whatever the verdict.
pub fn evaluate(blob: &[u8], original: &[u8]) -> RatioResult {
    let (format, decoded) = detect(blob);
    let (valid, error) = match decoded {
        None => (false, "decompression failed"),
        Some(decoded) if decoded != original => (false, "roundtrip mismatch"),
        Some(_) => (true, ""),
    };
    RatioResult {
        format: Some(format),
        compressed_size: blob.len(),
        valid,
        error: error.to_string(),
    }
}

/// Inflates a zlib or raw stream, requiring the end-of-stream marker.
fn inflate(blob: &[u8], mut decoder: Decompress) -> Option<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(blob.len().saturating_mul(4).max(64));
    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }
        let consumed = decoder.total_in() as usize;
        let produced = decoder.total_out();
        let input = blob.get(consumed..)?;
        match decoder.decompress_vec(input, &mut out, FlushDecompress::Finish) {
            Ok(Status::StreamEnd) => return Some(out),
            Ok(Status::Ok) | Ok(Status::BufError) => {
                // Spare output capacity and no progress: input ran out early.
                if decoder.total_in() as usize == consumed && decoder.total_out() == produced {
                    return None;
                }
            }
            Err(_) => return None,
        }
    }
}

fn gunzip(blob: &[u8]) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(blob).read_to_end(&mut decoded).ok()?;
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use proptest::prelude::*;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn raw(data: &[u8]) -> Vec<u8> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog, again and again and again";

    #[test]
    fn test_detect_zlib() {
        let (format, decoded) = detect(&zlib(TEXT));
        assert_eq!(format, StreamFormat::Zlib);
        assert_eq!(decoded.as_deref(), Some(TEXT));
    }

    #[test]
    fn test_detect_raw_deflate() {
        let (format, decoded) = detect(&raw(TEXT));
        assert_eq!(format, StreamFormat::RawDeflate);
        assert_eq!(decoded.as_deref(), Some(TEXT));
    }

    #[test]
    fn test_detect_gzip() {
        let (format, decoded) = detect(&gzip(TEXT));
        assert_eq!(format, StreamFormat::Gzip);
        assert_eq!(decoded.as_deref(), Some(TEXT));
    }

    #[test]
    fn test_detect_empty_blob_is_unknown() {
        assert_eq!(detect(b""), (StreamFormat::Unknown, None));
    }

    #[test]
    fn test_detect_plain_text_is_unknown() {
        assert_eq!(detect(b"hello world"), (StreamFormat::Unknown, None));
    }

    #[test]
    fn test_truncated_zlib_does_not_decode_as_zlib() {
        let mut blob = zlib(TEXT);
        blob.truncate(blob.len() - 4);
        let (format, _) = detect(&blob);
        assert_ne!(format, StreamFormat::Zlib);
    }

    #[test]
    fn test_corrupt_zlib_checksum_rejected() {
        let mut blob = zlib(TEXT);
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        let (format, _) = detect(&blob);
        assert_ne!(format, StreamFormat::Zlib);
    }

    #[test]
    fn test_large_expansion_decodes() {
        let data = vec![b'a'; 1 << 20];
        let (format, decoded) = detect(&zlib(&data));
        assert_eq!(format, StreamFormat::Zlib);
        assert_eq!(decoded.map(|d| d.len()), Some(1 << 20));
    }

    #[test]
    fn test_evaluate_valid() {
        let blob = zlib(TEXT);
        let result = evaluate(&blob, TEXT);
        assert!(result.valid);
        assert!(result.error.is_empty());
        assert_eq!(result.format, Some(StreamFormat::Zlib));
        assert_eq!(result.compressed_size, blob.len());
    }

    #[test]
    fn test_evaluate_thousand_zero_bytes() {
        let data = vec![0u8; 1000];
        let result = evaluate(&zlib(&data), &data);
        assert!(result.valid);
        assert!(result.compressed_size < 1000);
    }

    #[test]
    fn test_evaluate_off_by_one_is_mismatch() {
        let shorter = zlib(&TEXT[..TEXT.len() - 1]);
        let result = evaluate(&shorter, TEXT);
        assert!(!result.valid);
        assert_eq!(result.error, "roundtrip mismatch");

        let mut longer = TEXT.to_vec();
        longer.push(b'!');
        let result = evaluate(&zlib(&longer), TEXT);
        assert!(!result.valid);
        assert_eq!(result.error, "roundtrip mismatch");
    }

    #[test]
    fn test_evaluate_undecodable() {
        let result = evaluate(b"garbage", TEXT);
        assert!(!result.valid);
        assert_eq!(result.format, Some(StreamFormat::Unknown));
        assert_eq!(result.error, "decompression failed");
        assert_eq!(result.compressed_size, 7);
    }

    #[test]
    fn test_placeholder_results() {
        let missing = RatioResult::missing();
        assert!(!missing.valid);
        assert_eq!(missing.format_label(), "err");
        assert_eq!(missing.error, "missing ratio result");

        let failed = RatioResult::command_failed("exit status 2");
        assert_eq!(failed.error, "ratio command failed: exit status 2");
        assert_eq!(failed.compressed_size, 0);
    }

    proptest! {
        #[test]
        fn prop_every_encoding_roundtrips(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let (format, decoded) = detect(&zlib(&data));
            prop_assert_eq!(format, StreamFormat::Zlib);
            prop_assert_eq!(decoded.as_deref(), Some(&data[..]));

            let (format, decoded) = detect(&raw(&data));
            prop_assert_eq!(format, StreamFormat::RawDeflate);
            prop_assert_eq!(decoded.as_deref(), Some(&data[..]));

            let (format, decoded) = detect(&gzip(&data));
            prop_assert_eq!(format, StreamFormat::Gzip);
            prop_assert_eq!(decoded.as_deref(), Some(&data[..]));
        }

        #[test]
        fn prop_reserved_block_type_is_unknown(tail in prop::collection::vec(any::<u8>(), 0..256)) {
            // 'n' reads as a reserved DEFLATE block type and an invalid zlib/gzip header.
            let mut blob = vec![b'n'];
            blob.extend_from_slice(&tail);
            prop_assert_eq!(detect(&blob), (StreamFormat::Unknown, None));
        }

        #[test]
        fn prop_evaluate_valid_iff_exact(data in prop::collection::vec(any::<u8>(), 1..512)) {
            let blob = zlib(&data);
            prop_assert!(evaluate(&blob, &data).valid);
            prop_assert!(!evaluate(&blob, &data[..data.len() - 1]).valid);
        }
    }
}
