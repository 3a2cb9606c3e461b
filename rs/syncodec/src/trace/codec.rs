use std::path::Path;

use super::TraceWalk;
use crate::catalog::{Resolution, TraceCatalog};
use crate::{Codec, DEFAULT_FPS, DEFAULT_TARGET_RATE, Frame};

/// Replays pre-encoded trace files, picking the trace that matches the target rate.
///
/// Each advance walks one frame further through the catalog (wrapping past
/// the warm-up window), then selects the trace to read the frame size from:
/// the largest bitrate at the current resolution that does not exceed the
/// target rate, or the smallest available when the target sits below all of
/// them. In variable mode the resolution also climbs the ladder one label
/// at a time, steered by bits per pixel.
///
/// A codec whose catalog failed to load is permanently invalid; once valid
/// it stays valid forever, wrapping through the traces indefinitely.
pub struct TraceCodec {
	fps: f64,
	walk: Option<TraceWalk>,
	// The bitrate of the trace the current frame was read from, in kbps.
	matched_bitrate: u32,
	current: Frame,
}

impl TraceCodec {
	/// Load the catalog at `dir`/`prefix` with default fps, in variable mode.
	pub fn load(dir: impl AsRef<Path>, prefix: &str) -> Self {
		Self::load_with(dir, prefix, DEFAULT_FPS, false)
	}

	/// Load the catalog at `dir`/`prefix`.
	///
	/// A failed load is not an error here: the codec is returned invalid and
	/// the cause is logged, matching how consumers probe validity.
	pub fn load_with(dir: impl AsRef<Path>, prefix: &str, fps: f64, fixed: bool) -> Self {
		match TraceCatalog::load(dir, prefix) {
			Ok(catalog) => Self::new(catalog, fps, fixed),
			Err(err) => {
				tracing::warn!(%err, prefix, "trace catalog rejected");
				Self {
					fps,
					walk: None,
					matched_bitrate: 0,
					current: Frame::default(),
				}
			}
		}
	}

	/// Wrap an already-loaded catalog. Always valid.
	pub fn new(catalog: TraceCatalog, fps: f64, fixed: bool) -> Self {
		let mut codec = Self {
			fps,
			walk: Some(TraceWalk::new(catalog, fixed)),
			matched_bitrate: 0,
			current: Frame::default(),
		};
		codec.lookup();
		codec
	}

	/// The frame cadence.
	pub fn fps(&self) -> f64 {
		self.fps
	}

	/// The resolution the current frame was read at.
	pub fn resolution(&self) -> Option<Resolution> {
		self.walk.as_ref().map(|walk| walk.resolution)
	}

	/// The bitrate of the trace the current frame was read from, in kbps.
	pub fn matched_bitrate(&self) -> u32 {
		self.matched_bitrate
	}

	/// The index of the current frame within its sequence.
	pub fn frame_index(&self) -> usize {
		self.walk.as_ref().map_or(0, |walk| walk.frame_index)
	}

	/// Whether the resolution is pinned rather than adaptive.
	pub fn fixed_mode(&self) -> bool {
		self.walk.as_ref().is_some_and(|walk| walk.fixed_mode)
	}

	/// Pin or release the resolution; pinning snaps back to the fixed choice.
	pub fn set_fixed_mode(&mut self, fixed: bool) {
		if let Some(walk) = &mut self.walk {
			walk.set_fixed_mode(fixed);
		}
	}

	/// Choose the middle of the ladder for fixed mode.
	pub fn reset_fixed_resolution(&mut self) {
		if let Some(walk) = &mut self.walk {
			walk.reset_fixed_resolution();
		}
	}

	/// Choose `resolution` for fixed mode; false if the catalog has no trace there.
	pub fn set_fixed_resolution(&mut self, resolution: Resolution) -> bool {
		match &mut self.walk {
			Some(walk) => walk.set_fixed_resolution(resolution),
			None => false,
		}
	}

	/// Select the trace for the current frame and read its size.
	fn lookup(&mut self) {
		let Some(walk) = &self.walk else { return };

		// The largest trace at or below the target, else the smallest available.
		let matched = walk
			.catalog
			.floor_bitrate(walk.resolution, walk.target_kbps())
			.or_else(|| walk.catalog.min_bitrate(walk.resolution))
			.unwrap_or_default();

		if matched != self.matched_bitrate {
			tracing::debug!(from = self.matched_bitrate, to = matched, "switched trace");
		}
		self.matched_bitrate = matched;

		let size = walk
			.catalog
			.frame_size(walk.resolution, matched, walk.frame_index)
			.unwrap_or_default();

		self.current = Frame::zeroed(size as usize, 1.0 / self.fps);
		tracing::trace!(frame = ?self.current, "produced frame");
	}
}

impl Codec for TraceCodec {
	fn current(&self) -> &Frame {
		&self.current
	}

	fn advance(&mut self) {
		let Some(walk) = &mut self.walk else { return };

		walk.step_index();
		if !walk.fixed_mode {
			// Resolution reacts to the rate actually matched for the previous frame.
			walk.adjust_resolution(self.matched_bitrate as f64 * 1000.0, self.fps);
		}

		self.lookup();
	}

	fn valid(&self) -> bool {
		self.walk.is_some()
	}

	fn target_rate(&self) -> f32 {
		self.walk.as_ref().map_or(DEFAULT_TARGET_RATE, |walk| walk.target_rate)
	}

	fn set_target_rate(&mut self, bps: f32) -> f32 {
		match &mut self.walk {
			Some(walk) => walk.set_target_rate(bps),
			None => DEFAULT_TARGET_RATE,
		}
	}
}
