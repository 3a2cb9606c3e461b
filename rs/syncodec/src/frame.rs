use bytes::Bytes;
use derive_more::Debug;

/// A synthetic media frame: an opaque payload and an inter-frame delay.
///
/// Frames are the unit of codec output. The payload length is the semantic
/// frame (or packet) size; the bytes themselves are zeroed because no real
/// encoding takes place. The delay is how long the consumer should wait
/// before pulling the next frame, in seconds. It is a *logical* duration:
/// testbeds sleep on it, simulators advance virtual time.
/// The debug implementation shows only the payload length for brevity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	/// The zero-filled payload; its length is the encoded frame size.
	#[debug("{} bytes", payload.len())]
	pub payload: Bytes,

	/// Seconds to wait before requesting the next frame.
	pub delay: f64,
}

impl Frame {
	/// A frame of `size` zeroed bytes carrying the given inter-frame delay.
	pub fn zeroed(size: usize, delay: f64) -> Self {
		Self {
			payload: Bytes::from(vec![0u8; size]),
			delay,
		}
	}
}
