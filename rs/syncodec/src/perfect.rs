use bytes::Bytes;

use crate::{Codec, DEFAULT_TARGET_RATE, Frame};

/// Emits fixed-size packets at a cadence that exactly matches the target rate.
///
/// Every frame carries `max_payload` zeroed bytes and a delay of
/// `max_payload * 8 / target_rate` seconds, so the produced bitrate is the
/// target rate with no burstiness at all. Useful as the ideal baseline in
/// congestion control experiments.
pub struct PerfectCodec {
	// Shared zeroed payload; every frame clones the same allocation.
	payload: Bytes,
	target_rate: f32,
	current: Frame,
}

impl PerfectCodec {
	/// Create a codec producing `max_payload`-byte packets.
	pub fn new(max_payload: usize) -> Self {
		let mut codec = Self {
			payload: Bytes::from(vec![0u8; max_payload]),
			target_rate: DEFAULT_TARGET_RATE,
			current: Frame::default(),
		};
		codec.produce();
		codec
	}

	fn produce(&mut self) {
		self.current = Frame {
			payload: self.payload.clone(),
			delay: (self.payload.len() * 8) as f64 / self.target_rate as f64,
		};
	}
}

impl Codec for PerfectCodec {
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
