use std::path::Path;

use super::TraceWalk;
use crate::catalog::{Resolution, TraceCatalog};
use crate::{Codec, DEFAULT_FPS, DEFAULT_TARGET_RATE, Frame};

/// A [TraceCodec](crate::TraceCodec) variant that interpolates between traces.
///
/// Instead of snapping to the nearest recorded bitrate, each frame size is
/// interpolated linearly between the two traces bracketing the target rate
/// at the current resolution. Outside the recorded range the nearest trace
/// is scaled linearly with the target. Output therefore varies smoothly
/// with the target rate instead of in bitrate-grid steps.
///
/// Resolution adaptation follows the same ladder logic as the base codec,
/// but is steered by the exact target rate rather than the matched trace.
pub struct ScalingTraceCodec {
	fps: f64,
	walk: Option<TraceWalk>,
	current: Frame,
}

impl ScalingTraceCodec {
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

	/// Interpolate the size of the current frame from the bracketing traces.
	fn lookup(&mut self) {
		let Some(walk) = &self.walk else { return };

		let target_kbps = walk.target_rate as f64 / 1000.0;
		let size_at = |kbps: u32| {
			walk.catalog
				.frame_size(walk.resolution, kbps, walk.frame_index)
				.unwrap_or_default() as f64
		};

		let low = walk.catalog.floor_bitrate(walk.resolution, walk.target_kbps());
		let high = walk.catalog.ceil_bitrate(walk.resolution, walk.target_kbps());

		let interpolated = match (low, high) {
			(Some(low), Some(high)) => {
				let below = size_at(low);
				let above = size_at(high);
				below + (above - below) * (target_kbps - low as f64) / (high - low) as f64
			}
			// The target sits above every recorded trace.
			(Some(low), None) => size_at(low) * target_kbps / low as f64,
			// The target sits below every recorded trace.
			(None, Some(high)) => size_at(high) * target_kbps / high as f64,
			(None, None) => unreachable!("catalog resolutions always carry at least one bitrate"),
		};

		let size = interpolated.max(0.0).round() as usize;
		self.current = Frame::zeroed(size, 1.0 / self.fps);
		tracing::trace!(frame = ?self.current, "produced frame");
	}
}

impl Codec for ScalingTraceCodec {
	fn current(&self) -> &Frame {
		&self.current
	}

	fn advance(&mut self) {
		let Some(walk) = &mut self.walk else { return };

		walk.step_index();
		if !walk.fixed_mode {
			// Unlike the base codec, the exact target steers the ladder.
			walk.adjust_resolution(walk.target_rate as f64, self.fps);
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
