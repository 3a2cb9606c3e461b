use crate::{Codec, DEFAULT_FPS, DEFAULT_TARGET_RATE, Frame};

/// Emits one frame per 1/fps, sized so the frame rate meets the target rate.
///
/// The delay is constant; only the payload length reacts to rate changes.
pub struct SimpleFpsCodec {
	fps: f64,
	target_rate: f32,
	current: Frame,
}

impl SimpleFpsCodec {
	/// Create a codec emitting `fps` frames per second.
	pub fn new(fps: f64) -> Self {
		let mut codec = Self {
			fps,
			target_rate: DEFAULT_TARGET_RATE,
			current: Frame::default(),
		};
		codec.produce();
		codec
	}

	/// The frame cadence.
	pub fn fps(&self) -> f64 {
		self.fps
	}

	fn produce(&mut self) {
		let size = (self.target_rate as f64 / (8.0 * self.fps)).round() as usize;
		self.current = Frame::zeroed(size, 1.0 / self.fps);
	}
}

impl Default for SimpleFpsCodec {
	fn default() -> Self {
		Self::new(DEFAULT_FPS)
	}
}

impl Codec for SimpleFpsCodec {
	fn current(&self) -> &Frame {
		&self.current
	}

	fn advance(&mut self) {
		self.produce();
	}

	fn valid(&self) -> bool {
		true
	}

	fn target_rate(&self) -> f32 {
		self.target_rate
	}

	fn set_target_rate(&mut self, bps: f32) -> f32 {
		if bps > 0.0 {
			self.target_rate = bps;
		}
		self.target_rate
	}
}
