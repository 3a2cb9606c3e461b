mod resolution;

pub use resolution::*;

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;

use syncodec_trace::LineRecord;

use crate::{Error, Result};

/// Smallest admissible trace bitrate, in kbps.
pub const TRACE_MIN_BITRATE: u32 = 100;

/// Largest admissible trace bitrate, in kbps.
pub const TRACE_MAX_BITRATE: u32 = 6000;

/// Trace bitrates must be divisible by this step, in kbps.
pub const TRACE_BITRATE_STEP: u32 = 100;

/// Leading warm-up frames skipped when playback wraps around.
///
/// The head of a pre-encoded run carries the encoder's start-up transient
/// (the oversized first I-frame in particular), so wrapping restarts after
/// it rather than at frame zero.
pub const N_FRAMES_EXCLUDED: usize = 20;

/// All frames of one pre-encoded (resolution, bitrate) run, in encode order.
pub type FrameSequence = Vec<LineRecord>;

/// An immutable two-level index over a directory of pre-encoded trace files.
///
/// The outer level is keyed by [Resolution] in canonical ascending order and
/// the inner level by bitrate in kbps, ascending. Every sequence has the
/// same length, verified at load time, and the catalog is never empty once
/// constructed. Codecs own their catalog; it never changes after load.
#[derive(Debug, Clone)]
pub struct TraceCatalog {
	traces: BTreeMap<Resolution, BTreeMap<u32, FrameSequence>>,
	frame_count: usize,
}

impl TraceCatalog {
	/// Scan `dir` for files named `<prefix>_<label>_<bitrate>.txt` and index them.
	///
	/// Files with unknown labels, off-grid bitrates or non-matching names are
	/// skipped. Fails if nothing admissible was found, a trace could not be
	/// parsed, or the loaded sequences disagree in length.
	pub fn load(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
		let mut traces: BTreeMap<Resolution, BTreeMap<u32, FrameSequence>> = BTreeMap::new();

		for entry in std::fs::read_dir(dir)? {
			let entry = entry?;
			let name = entry.file_name();
			let Some(name) = name.to_str() else { continue };

			let Some((resolution, bitrate)) = parse_file_name(name, prefix) else {
				if name.starts_with(prefix) {
					tracing::debug!(file = name, "skipping file");
				}
				continue;
			};

			let sequence = syncodec_trace::read_trace(entry.path())?;
			tracing::debug!(%resolution, bitrate, frames = sequence.len(), "loaded trace");
			traces.entry(resolution).or_default().insert(bitrate, sequence);
		}

		Self::index(traces)
	}

	fn index(traces: BTreeMap<Resolution, BTreeMap<u32, FrameSequence>>) -> Result<Self> {
		let mut frame_count = None;

		for (&resolution, by_bitrate) in &traces {
			for (&bitrate, sequence) in by_bitrate {
				// Every sequence must be long enough to wrap past the warm-up
				// window and agree in length with the others.
				if sequence.len() <= N_FRAMES_EXCLUDED {
					return Err(Error::SequenceTooShort {
						resolution,
						bitrate,
						len: sequence.len(),
					});
				}

				match frame_count {
					None => frame_count = Some(sequence.len()),
					Some(expected) if sequence.len() != expected => {
						return Err(Error::UnevenSequences {
							resolution,
							bitrate,
							expected,
							found: sequence.len(),
						});
					}
					Some(_) => {}
				}
			}
		}

		let frame_count = frame_count.ok_or(Error::EmptyCatalog)?;
		Ok(Self { traces, frame_count })
	}

	/// The number of frames in every sequence.
	pub fn frame_count(&self) -> usize {
		self.frame_count
	}

	/// The resolutions present, smallest to largest.
	pub fn resolutions(&self) -> impl Iterator<Item = Resolution> + '_ {
		self.traces.keys().copied()
	}

	/// Whether any trace exists at `resolution`.
	pub fn contains(&self, resolution: Resolution) -> bool {
		self.traces.contains_key(&resolution)
	}

	/// The bitrates available at `resolution`, ascending, in kbps.
	pub fn bitrates(&self, resolution: Resolution) -> impl Iterator<Item = u32> + '_ {
		self.traces
			.get(&resolution)
			.into_iter()
			.flat_map(|by_bitrate| by_bitrate.keys().copied())
	}

	/// The sequence recorded at (`resolution`, `bitrate` kbps), if present.
	pub fn sequence(&self, resolution: Resolution, bitrate: u32) -> Option<&FrameSequence> {
		self.traces.get(&resolution)?.get(&bitrate)
	}

	/// The size in bytes of frame `index` of the given run.
	pub fn frame_size(&self, resolution: Resolution, bitrate: u32, index: usize) -> Option<u32> {
		Some(self.sequence(resolution, bitrate)?.get(index)?.size_bytes)
	}

	/// The resolution in the middle of the available ladder.
	pub fn middle_resolution(&self) -> Resolution {
		// Construction guarantees at least one resolution.
		self.traces.keys().copied().nth(self.traces.len() / 2).unwrap()
	}

	/// The largest bitrate at `resolution` not exceeding `kbps`.
	pub fn floor_bitrate(&self, resolution: Resolution, kbps: u32) -> Option<u32> {
		self.traces
			.get(&resolution)?
			.range(..=kbps)
			.next_back()
			.map(|(&bitrate, _)| bitrate)
	}

	/// The smallest bitrate at `resolution` strictly above `kbps`.
	pub fn ceil_bitrate(&self, resolution: Resolution, kbps: u32) -> Option<u32> {
		self.traces
			.get(&resolution)?
			.range((Bound::Excluded(kbps), Bound::Unbounded))
			.next()
			.map(|(&bitrate, _)| bitrate)
	}

	/// The smallest bitrate available at `resolution`.
	pub fn min_bitrate(&self, resolution: Resolution) -> Option<u32> {
		self.bitrates(resolution).next()
	}

	/// The next resolution above `from` present in the catalog.
	pub fn up(&self, from: Resolution) -> Option<Resolution> {
		self.traces
			.range((Bound::Excluded(from), Bound::Unbounded))
			.next()
			.map(|(&resolution, _)| resolution)
	}

	/// The next resolution below `from` present in the catalog.
	pub fn down(&self, from: Resolution) -> Option<Resolution> {
		self.traces.range(..from).next_back().map(|(&resolution, _)| resolution)
	}
}

fn parse_file_name(name: &str, prefix: &str) -> Option<(Resolution, u32)> {
	let rest = name.strip_prefix(prefix)?.strip_prefix('_')?.strip_suffix(".txt")?;
	let (label, bitrate) = rest.rsplit_once('_')?;

	let resolution = label.parse().ok()?;
	let bitrate: u32 = bitrate.parse().ok()?;

	if !(TRACE_MIN_BITRATE..=TRACE_MAX_BITRATE).contains(&bitrate) || bitrate % TRACE_BITRATE_STEP != 0 {
		return None;
	}

	Some((resolution, bitrate))
}

#[cfg(test)]
pub(crate) mod testing {
	use std::path::Path;

	/// Write a trace file the loader will pick up, one size per line.
	pub fn write_trace(dir: &Path, prefix: &str, label: &str, kbps: u32, sizes: &[u32]) {
		let lines: Vec<String> = sizes.iter().map(|size| size.to_string()).collect();
		std::fs::write(dir.join(format!("{prefix}_{label}_{kbps}.txt")), lines.join("\n")).unwrap();
	}

	/// A constant-size sequence long enough to wrap.
	pub fn flat(size: u32, len: usize) -> Vec<u32> {
		vec![size; len]
	}
}

#[cfg(test)]
mod tests {
	use super::{testing::*, *};

	#[test]
	fn loads_and_indexes() {
		let dir = tempfile::tempdir().unwrap();
		write_trace(dir.path(), "demo", "720p", 1000, &flat(5000, 30));
		write_trace(dir.path(), "demo", "720p", 500, &flat(2500, 30));
		write_trace(dir.path(), "demo", "360p", 300, &flat(1500, 30));

		let catalog = TraceCatalog::load(dir.path(), "demo").unwrap();
		assert_eq!(catalog.frame_count(), 30);

		// Outer order is the resolution ladder, inner order ascending bitrate.
		let resolutions: Vec<_> = catalog.resolutions().collect();
		assert_eq!(resolutions, vec![Resolution::R360p, Resolution::R720p]);
		let bitrates: Vec<_> = catalog.bitrates(Resolution::R720p).collect();
		assert_eq!(bitrates, vec![500, 1000]);

		assert_eq!(catalog.frame_size(Resolution::R720p, 1000, 0), Some(5000));
		assert_eq!(catalog.frame_size(Resolution::R720p, 1000, 30), None);
	}

	#[test]
	fn skips_inadmissible_files() {
		let dir = tempfile::tempdir().unwrap();
		write_trace(dir.path(), "demo", "720p", 1000, &flat(5000, 30));
		// Unknown label, off-grid bitrates, wrong prefix, wrong extension.
		write_trace(dir.path(), "demo", "600p", 1000, &flat(1, 30));
		write_trace(dir.path(), "demo", "720p", 250, &flat(1, 30));
		write_trace(dir.path(), "demo", "720p", 7000, &flat(1, 30));
		write_trace(dir.path(), "other", "720p", 1000, &flat(1, 30));
		std::fs::write(dir.path().join("demo_720p_500.csv"), "1\n").unwrap();
		std::fs::write(dir.path().join("README"), "not a trace").unwrap();

		let catalog = TraceCatalog::load(dir.path(), "demo").unwrap();
		assert_eq!(catalog.resolutions().count(), 1);
		assert_eq!(catalog.bitrates(Resolution::R720p).collect::<Vec<_>>(), vec![1000]);
	}

	#[test]
	fn rejects_empty_directory() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(TraceCatalog::load(dir.path(), "demo"), Err(Error::EmptyCatalog)));
	}

	#[test]
	fn rejects_missing_directory() {
		assert!(matches!(
			TraceCatalog::load("/does/not/exist", "demo"),
			Err(Error::Io(_))
		));
	}

	#[test]
	fn rejects_uneven_lengths() {
		let dir = tempfile::tempdir().unwrap();
		write_trace(dir.path(), "demo", "720p", 500, &flat(2500, 30));
		write_trace(dir.path(), "demo", "720p", 1000, &flat(5000, 31));

		assert!(matches!(
			TraceCatalog::load(dir.path(), "demo"),
			Err(Error::UnevenSequences { expected: 30, found: 31, .. })
		));
	}

	#[test]
	fn rejects_short_sequences() {
		let dir = tempfile::tempdir().unwrap();
		// Needs at least N_FRAMES_EXCLUDED + 1 frames to wrap.
		write_trace(dir.path(), "demo", "720p", 500, &flat(2500, N_FRAMES_EXCLUDED));

		assert!(matches!(
			TraceCatalog::load(dir.path(), "demo"),
			Err(Error::SequenceTooShort { len: 20, .. })
		));
	}

	#[test]
	fn bitrate_lookups() {
		let dir = tempfile::tempdir().unwrap();
		for kbps in [500, 1000, 1500] {
			write_trace(dir.path(), "demo", "720p", kbps, &flat(kbps, 30));
		}
		let catalog = TraceCatalog::load(dir.path(), "demo").unwrap();

		assert_eq!(catalog.floor_bitrate(Resolution::R720p, 1200), Some(1000));
		assert_eq!(catalog.floor_bitrate(Resolution::R720p, 1000), Some(1000));
		assert_eq!(catalog.floor_bitrate(Resolution::R720p, 400), None);
		assert_eq!(catalog.ceil_bitrate(Resolution::R720p, 1200), Some(1500));
		assert_eq!(catalog.ceil_bitrate(Resolution::R720p, 1500), None);
		assert_eq!(catalog.min_bitrate(Resolution::R720p), Some(500));
		assert_eq!(catalog.min_bitrate(Resolution::R360p), None);
	}

	#[test]
	fn ladder_navigation() {
		let dir = tempfile::tempdir().unwrap();
		for label in ["240p", "480p", "720p"] {
			write_trace(dir.path(), "demo", label, 500, &flat(1000, 30));
		}
		let catalog = TraceCatalog::load(dir.path(), "demo").unwrap();

		assert_eq!(catalog.middle_resolution(), Resolution::R480p);
		// Steps skip labels absent from the catalog (no 540p here).
		assert_eq!(catalog.up(Resolution::R480p), Some(Resolution::R720p));
		assert_eq!(catalog.up(Resolution::R720p), None);
		assert_eq!(catalog.down(Resolution::R480p), Some(Resolution::R240p));
		assert_eq!(catalog.down(Resolution::R240p), None);
		// Navigation from a label that is itself absent still works.
		assert_eq!(catalog.up(Resolution::R360p), Some(Resolution::R480p));
		assert_eq!(catalog.down(Resolution::R360p), Some(Resolution::R240p));
	}

	#[test]
	fn file_name_parsing() {
		assert_eq!(
			parse_file_name("demo_720p_1200.txt", "demo"),
			Some((Resolution::R720p, 1200))
		);
		// Prefixes may themselves contain underscores.
		assert_eq!(
			parse_file_name("my_video_90p_100.txt", "my_video"),
			Some((Resolution::R90p, 100))
		);
		assert_eq!(parse_file_name("demo_720p_1200.txt", "other"), None);
		assert_eq!(parse_file_name("demo_720p_1250.txt", "demo"), None);
		assert_eq!(parse_file_name("demo_720p_0.txt", "demo"), None);
		assert_eq!(parse_file_name("demo_720p_6100.txt", "demo"), None);
		assert_eq!(parse_file_name("demo_719p_1200.txt", "demo"), None);
		assert_eq!(parse_file_name("demo_720p.txt", "demo"), None);
		assert_eq!(parse_file_name("demo_720p_1200.log", "demo"), None);
	}
}
