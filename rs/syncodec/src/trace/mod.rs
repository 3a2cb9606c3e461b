mod codec;
mod scaling;

pub use codec::*;
pub use scaling::*;

use crate::DEFAULT_TARGET_RATE;
use crate::catalog::{N_FRAMES_EXCLUDED, Resolution, TraceCatalog};

// Bits-per-pixel window the adaptive resolution logic steers by, anchored
// at typical 480p operating points.
const LOW_BPP_THRESH: f64 = 0.05;
const HIGH_BPP_THRESH: f64 = 0.1;

/// State shared by the trace-driven codecs: the frame walk, the position on
/// the resolution ladder and the target rate.
struct TraceWalk {
	catalog: TraceCatalog,
	target_rate: f32,
	frame_index: usize,
	resolution: Resolution,
	fixed_resolution: Resolution,
	fixed_mode: bool,
}

impl TraceWalk {
	fn new(catalog: TraceCatalog, fixed: bool) -> Self {
		let middle = catalog.middle_resolution();
		Self {
			catalog,
			target_rate: DEFAULT_TARGET_RATE,
			frame_index: 0,
			resolution: middle,
			fixed_resolution: middle,
			fixed_mode: fixed,
		}
	}

	/// Move to the next frame, wrapping past the warm-up window.
	fn step_index(&mut self) {
		self.frame_index += 1;
		if self.frame_index >= self.catalog.frame_count() {
			self.frame_index = N_FRAMES_EXCLUDED;
		}
	}

	/// The target rate in whole kbps.
	fn target_kbps(&self) -> u32 {
		(self.target_rate / 1000.0) as u32
	}

	fn set_target_rate(&mut self, bps: f32) -> f32 {
		if bps > 0.0 {
			self.target_rate = bps;
		}
		self.target_rate
	}

	/// Bits per pixel of `rate_bps` at the current resolution.
	///
	/// Above 480p the pixel budget stays at 480p and the rate is discounted
	/// by Waggoner's 0.75 power rule, keeping the thresholds on one scale.
	fn bits_per_pixel(&self, rate_bps: f64, fps: f64) -> f64 {
		let pixels = self.resolution.pixels() as f64;
		let reference = Resolution::R480p.pixels() as f64;

		let (scaling, target_pixels) = if self.resolution <= Resolution::R480p {
			(1.0, pixels)
		} else {
			((pixels / reference).powf(0.75), reference)
		};

		rate_bps / (fps * target_pixels * scaling)
	}

	/// Move at most one label on the ladder, driven by bits per pixel.
	fn adjust_resolution(&mut self, rate_bps: f64, fps: f64) {
		let bpp = self.bits_per_pixel(rate_bps, fps);

		if bpp < LOW_BPP_THRESH {
			if let Some(up) = self.catalog.up(self.resolution) {
				tracing::debug!(from = %self.resolution, to = %up, bpp, "stepping resolution up");
				self.resolution = up;
			}
		} else if bpp > HIGH_BPP_THRESH {
			if let Some(down) = self.catalog.down(self.resolution) {
				tracing::debug!(from = %self.resolution, to = %down, bpp, "stepping resolution down");
				self.resolution = down;
			}
		}
	}

	fn set_fixed_mode(&mut self, fixed: bool) {
		self.fixed_mode = fixed;
		if fixed {
			self.resolution = self.fixed_resolution;
		}
	}

	/// Pin fixed mode back to the middle of the ladder.
	fn reset_fixed_resolution(&mut self) {
		self.fixed_resolution = self.catalog.middle_resolution();
		if self.fixed_mode {
			self.resolution = self.fixed_resolution;
		}
	}

	/// Pin fixed mode to `resolution`; false if the catalog has no trace there.
	fn set_fixed_resolution(&mut self, resolution: Resolution) -> bool {
		if !self.catalog.contains(resolution) {
			return false;
		}

		self.fixed_resolution = resolution;
		if self.fixed_mode {
			self.resolution = resolution;
		}
		true
	}
}
