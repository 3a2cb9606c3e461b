//! # syncodec-trace: reader for pre-encoded video trace files
//!
//! A trace file captures one real encoder run: one frame per line, plain text.
//! The first column is the encoded frame size in bytes; an optional second
//! column is the frame type (`I` or `P`) and an optional third column is the
//! luma PSNR in dB. Blank lines and lines starting with `#` are skipped.
//!
//! Consumers that only care about frame sizes can ignore everything but
//! [LineRecord::size_bytes]; the remaining columns are parsed and preserved.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Error types for trace file parsing.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The file could not be opened or read.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// A line did not follow the `size [type [psnr]]` column layout.
	#[error("malformed trace line {line}: {reason}")]
	Malformed { line: usize, reason: &'static str },
}

/// A Result type alias for trace reader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Whether a traced frame was intra-coded or predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameType {
	/// An I-frame, decodable on its own.
	Intra,
	/// A P-frame, predicted from earlier frames.
	#[default]
	Predicted,
}

impl FromStr for FrameType {
	type Err = &'static str;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"I" | "i" => Ok(Self::Intra),
			"P" | "p" => Ok(Self::Predicted),
			_ => Err("expected frame type I or P"),
		}
	}
}

/// A single line of a trace file: one encoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
	/// Encoded frame size in bytes.
	pub size_bytes: u32,

	/// Frame type; predicted when the column is absent.
	pub frame_type: FrameType,

	/// Luma PSNR in dB, when the encoder reported one.
	pub psnr: Option<f64>,
}

impl FromStr for LineRecord {
	type Err = &'static str;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let mut columns = s.split_whitespace();

		let size_bytes = columns
			.next()
			.ok_or("empty line")?
			.parse()
			.map_err(|_| "expected frame size in bytes")?;

		let frame_type = match columns.next() {
			Some(column) => column.parse()?,
			None => FrameType::default(),
		};

		let psnr = match columns.next() {
			Some(column) => Some(column.parse().map_err(|_| "expected psnr in dB")?),
			None => None,
		};

		if columns.next().is_some() {
			return Err("trailing columns");
		}

		Ok(Self {
			size_bytes,
			frame_type,
			psnr,
		})
	}
}

/// Read every frame of the trace file at `path`, in file order.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<LineRecord>> {
	let file = File::open(path)?;
	let mut records = Vec::new();

	for (index, line) in BufReader::new(file).lines().enumerate() {
		let line = line?;
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		let record = line.parse().map_err(|reason| Error::Malformed {
			// Line numbers are 1-based in editors and error messages.
			line: index + 1,
			reason,
		})?;

		records.push(record);
	}

	Ok(records)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn write_trace(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn size_only() {
		let file = write_trace("1000\n1200\n800\n");
		let records = read_trace(file.path()).unwrap();

		assert_eq!(records.len(), 3);
		assert_eq!(records[0].size_bytes, 1000);
		assert_eq!(records[0].frame_type, FrameType::Predicted);
		assert_eq!(records[0].psnr, None);
		assert_eq!(records[2].size_bytes, 800);
	}

	#[test]
	fn full_columns() {
		let file = write_trace("# frame size, type, psnr\n4800 I 38.2\n1100 P 36.9\n\n900 P 36.4\n");
		let records = read_trace(file.path()).unwrap();

		assert_eq!(records.len(), 3);
		assert_eq!(records[0].frame_type, FrameType::Intra);
		assert_eq!(records[0].psnr, Some(38.2));
		assert_eq!(records[1].size_bytes, 1100);
		assert_eq!(records[1].frame_type, FrameType::Predicted);
	}

	#[test]
	fn malformed_size() {
		let file = write_trace("1000\nnot-a-size\n");
		let err = read_trace(file.path()).unwrap_err();

		assert!(matches!(err, Error::Malformed { line: 2, .. }));
	}

	#[test]
	fn malformed_type() {
		let file = write_trace("1000 X\n");
		assert!(matches!(read_trace(file.path()), Err(Error::Malformed { line: 1, .. })));
	}

	#[test]
	fn missing_file() {
		assert!(matches!(read_trace("/does/not/exist.txt"), Err(Error::Io(_))));
	}
}
