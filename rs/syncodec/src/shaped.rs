use bytes::Bytes;

use crate::{Codec, DEFAULT_TARGET_RATE, Frame};

/// Wraps a codec and emits its frames as MTU-bounded fragments.
///
/// Each inner frame is sliced into `ceil(len / max_payload)` fragments and
/// the inner frame's delay is spread evenly across them, so the wire sees a
/// smooth packet train instead of one burst per frame. The per-packet
/// overhead is fed back as rate pressure: before each pull the inner codec
/// is asked for `target_rate / overhead_factor`, where the factor is the
/// wire-bytes-per-payload-byte ratio observed on the previous inner frame.
/// The wire rate including overhead therefore converges on the target.
///
/// The packetizer owns its inner codec exclusively and releases it on drop;
/// it cannot be cloned. Call [advance](Codec::advance) before reading the
/// first fragment.
pub struct ShapedPacketizer {
	inner: Box<dyn Codec + Send>,
	max_payload: usize,
	overhead: usize,

	// Remaining unsent bytes of the current inner frame.
	queue: Bytes,
	// Inter-frame delay of the current inner frame.
	inner_delay: f64,
	// Fragment count of the current inner frame.
	fragments: usize,
	// Wire bytes per payload byte of the previous inner frame.
	overhead_factor: f64,

	target_rate: f32,
	current: Frame,
}

impl ShapedPacketizer {
	/// Wrap `inner`, fragmenting to `max_payload` bytes and accounting
	/// `overhead` extra wire bytes per fragment.
	pub fn new(inner: impl Codec + Send + 'static, max_payload: usize, overhead: usize) -> Self {
		assert!(max_payload > 0, "max_payload must be positive");

		Self {
			inner: Box::new(inner),
			max_payload,
			overhead,
			queue: Bytes::new(),
			inner_delay: 0.0,
			fragments: 1,
			overhead_factor: 1.0,
			target_rate: DEFAULT_TARGET_RATE,
			current: Frame::default(),
		}
	}

	/// Release the inner codec.
	pub fn into_inner(self) -> Box<dyn Codec + Send> {
		self.inner
	}

	/// Pull the next inner frame into the fragment queue.
	fn pull(&mut self) {
		// Leave headroom for this frame's overhead, estimated from the
		// fragmentation of the previous one.
		let goal = self.target_rate / self.overhead_factor as f32;
		self.inner.set_target_rate(goal);
		self.inner.advance();

		let frame = self.inner.current();
		self.queue = frame.payload.clone();
		self.inner_delay = frame.delay;
		self.fragments = self.queue.len().div_ceil(self.max_payload).max(1);

		self.overhead_factor = if self.queue.is_empty() {
			1.0
		} else {
			1.0 + (self.fragments * self.overhead) as f64 / self.queue.len() as f64
		};
	}
}

impl Codec for ShapedPacketizer {
	fn current(&self) -> &Frame {
		&self.current
	}

	fn advance(&mut self) {
		if self.queue.is_empty() {
			self.pull();
		}

		let take = self.queue.len().min(self.max_payload);
		self.current = Frame {
			payload: self.queue.split_to(take),
			delay: self.inner_delay / self.fragments as f64,
		};
	}

	fn valid(&self) -> bool {
		self.inner.valid()
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
