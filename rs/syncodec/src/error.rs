use crate::catalog::Resolution;

/// Error types for building a trace catalog.
///
/// Codec constructors never surface these directly: a codec whose catalog
/// failed to load reports `valid() == false` and logs the cause. The error
/// is public for callers that load a [crate::TraceCatalog] themselves.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// An error from the trace file reader.
	#[error("trace error: {0}")]
	Trace(#[from] syncodec_trace::Error),

	/// Filesystem error while scanning the trace directory.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// The label is not one of the known resolution labels.
	#[error("unknown resolution: {0}")]
	UnknownResolution(String),

	/// No admissible trace file was found.
	#[error("empty catalog")]
	EmptyCatalog,

	/// Two sequences in the same catalog differ in length.
	#[error("uneven trace: {resolution} at {bitrate} kbps has {found} frames, expected {expected}")]
	UnevenSequences {
		resolution: Resolution,
		bitrate: u32,
		expected: usize,
		found: usize,
	},

	/// A sequence is too short to wrap past the warm-up window.
	#[error("trace too short: {resolution} at {bitrate} kbps has {len} frames")]
	SequenceTooShort {
		resolution: Resolution,
		bitrate: u32,
		len: usize,
	},
}

/// A Result type alias for syncodec operations.
pub type Result<T> = std::result::Result<T, Error>;
