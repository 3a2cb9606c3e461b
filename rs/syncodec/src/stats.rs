use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{Codec, DEFAULT_FPS, DEFAULT_TARGET_RATE, Frame};

/// Spread of the default multiplicative noise: sizes are scaled by a
/// uniform draw from `[1 - R, 1 + R]`.
pub const RAND_UNIFORM_MAX_RATIO: f64 = 0.1;

/// Tuning for [StatisticsCodec].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatisticsCodecConfig {
	/// Frames per second.
	pub fps: f64,

	/// Largest relative rate change adopted outside a transient.
	/// Larger requests are clamped; zero disables clamping.
	pub max_update_ratio: f32,

	/// Minimum seconds between accepted rate updates.
	pub update_interval: f64,

	/// Relative rate change that triggers a transient phase.
	pub big_change_ratio: f32,

	/// Number of frames in a transient phase, I-frame included.
	pub transient_length: u32,

	/// Nominal I-frame size as a multiple of the steady frame size.
	pub i_frame_ratio: f64,
}

impl Default for StatisticsCodecConfig {
	fn default() -> Self {
		Self {
			fps: DEFAULT_FPS,
			max_update_ratio: 0.10,
			update_interval: 0.10,
			big_change_ratio: 0.50,
			transient_length: 10,
			i_frame_ratio: 4.0,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Steady,
	Transient,
}

/// Models an encoder statistically instead of replaying traces.
///
/// In the steady phase every frame is the target rate split evenly across
/// the frame rate, passed through a noise function. A sufficiently large
/// rate change starts a transient phase: one oversized I-frame followed by
/// undersized frames that amortize its excess, the way an encoder restarts
/// its rate control after a big reconfiguration. Small changes are clamped
/// and all changes are throttled to one per update interval.
///
/// The noise function is pluggable and the default one draws from a
/// per-instance seedable PRNG, so runs are reproducible.
pub struct StatisticsCodec {
	config: StatisticsCodecConfig,
	target_rate: f32,
	phase: Phase,
	remaining_burst_frames: u32,
	time_to_update: f64,
	noise: Box<dyn FnMut(f64) -> f64 + Send>,
	current: Frame,
}

impl StatisticsCodec {
	/// Create a codec with default tuning and OS-seeded noise.
	pub fn new(fps: f64) -> Self {
		Self::with_config(StatisticsCodecConfig {
			fps,
			..Default::default()
		})
	}

	/// Create a codec with the given tuning and OS-seeded noise.
	pub fn with_config(config: StatisticsCodecConfig) -> Self {
		Self::with_noise(config, uniform_noise(SmallRng::from_os_rng()))
	}

	/// Create a codec whose noise is reproducible from `seed`.
	pub fn with_seed(config: StatisticsCodecConfig, seed: u64) -> Self {
		Self::with_noise(config, uniform_noise(SmallRng::seed_from_u64(seed)))
	}

	/// Create a codec with an injected noise function.
	///
	/// The function receives the nominal frame size in bytes and returns the
	/// noisy one; results are clamped to be non-negative.
	pub fn with_noise(config: StatisticsCodecConfig, noise: impl FnMut(f64) -> f64 + Send + 'static) -> Self {
		let mut codec = Self {
			config,
			target_rate: DEFAULT_TARGET_RATE,
			phase: Phase::Steady,
			remaining_burst_frames: 0,
			time_to_update: 0.0,
			noise: Box::new(noise),
			current: Frame::default(),
		};
		codec.produce();
		codec
	}

	/// The tuning this codec runs with.
	pub fn config(&self) -> &StatisticsCodecConfig {
		&self.config
	}

	/// Whether a transient burst is in progress.
	pub fn in_transient(&self) -> bool {
		self.phase == Phase::Transient
	}

	/// The steady frame size for the current target rate, in bytes.
	fn base_size(&self) -> f64 {
		self.target_rate as f64 / (8.0 * self.config.fps)
	}

	fn produce(&mut self) {
		let base = self.base_size();

		let nominal = match self.phase {
			Phase::Steady => base,
			// The burst opens with the I-frame, then amortizes its excess
			// over the remaining frames without letting any collapse.
			Phase::Transient if self.remaining_burst_frames == self.config.transient_length => {
				self.config.i_frame_ratio * base
			}
			Phase::Transient => {
				let spread = (self.config.transient_length - 1) as f64;
				let amortized = base - (self.config.i_frame_ratio - 1.0) * base / spread;
				amortized.max(0.2 * base)
			}
		};

		let size = (self.noise)(nominal).max(0.0).round() as usize;
		self.current = Frame::zeroed(size, 1.0 / self.config.fps);
	}
}

fn uniform_noise(mut rng: SmallRng) -> impl FnMut(f64) -> f64 + Send {
	move |size| size * rng.random_range(1.0 - RAND_UNIFORM_MAX_RATIO..=1.0 + RAND_UNIFORM_MAX_RATIO)
}

impl Codec for StatisticsCodec {
	fn current(&self) -> &Frame {
		&self.current
	}

	fn advance(&mut self) {
		self.produce();

		self.time_to_update = (self.time_to_update - 1.0 / self.config.fps).max(0.0);

		if self.phase == Phase::Transient {
			self.remaining_burst_frames = self.remaining_burst_frames.saturating_sub(1);
			if self.remaining_burst_frames == 0 {
				self.phase = Phase::Steady;
			}
		}
	}

	fn valid(&self) -> bool {
		true
	}

	fn target_rate(&self) -> f32 {
		self.target_rate
	}

	fn set_target_rate(&mut self, bps: f32) -> f32 {
		if !(bps > 0.0) {
			return self.target_rate;
		}

		// At most one accepted update per interval.
		if self.time_to_update > 0.0 {
			tracing::trace!(bps, "rate update throttled");
			return self.target_rate;
		}

		let old = self.target_rate;
		let ratio = (bps - old).abs() / old;

		if ratio >= self.config.big_change_ratio && self.config.transient_length > 0 {
			tracing::debug!(from = old, to = bps, "big rate change, entering transient");
			self.target_rate = bps;
			self.phase = Phase::Transient;
			self.remaining_burst_frames = self.config.transient_length;
		} else if self.config.max_update_ratio > 0.0 && ratio > self.config.max_update_ratio {
			let clamped = if bps > old {
				old * (1.0 + self.config.max_update_ratio)
			} else {
				old * (1.0 - self.config.max_update_ratio)
			};
			tracing::debug!(from = old, requested = bps, to = clamped, "rate change clamped");
			self.target_rate = clamped;
		} else {
			self.target_rate = bps;
		}

		self.time_to_update = self.config.update_interval;
		self.target_rate
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn quiet(fps: f64) -> StatisticsCodec {
		let config = StatisticsCodecConfig {
			fps,
			..Default::default()
		};
		StatisticsCodec::with_noise(config, |size| size)
	}

	/// Advance for one second of media time so the update throttle expires.
	fn run_for_a_second(codec: &mut StatisticsCodec) {
		for _ in 0..codec.config().fps as usize {
			codec.advance();
		}
	}

	#[test]
	fn steady_frame_size() {
		let mut codec = quiet(25.0);
		// Jumping up from the starting rate is itself a big change; burn the
		// resulting transient before checking the steady phase.
		codec.set_target_rate(500_000.0);
		run_for_a_second(&mut codec);

		for _ in 0..10 {
			codec.advance();
			// 500_000 / (8 * 25) = 2500 bytes at 40 ms.
			assert_eq!(codec.current().payload.len(), 2500);
			assert_eq!(codec.current().delay, 0.04);
		}
	}

	#[test]
	fn big_change_runs_a_transient() {
		let mut codec = quiet(30.0);
		codec.set_target_rate(500_000.0);
		run_for_a_second(&mut codec);

		// Doubling the rate is a big change.
		assert_eq!(codec.set_target_rate(1_000_000.0), 1_000_000.0);
		assert!(codec.in_transient());

		let base: f64 = 1_000_000.0 / (8.0 * 30.0);
		let mut sizes = Vec::new();
		for _ in 0..10 {
			codec.advance();
			sizes.push(codec.current().payload.len() as f64);
		}

		// I-frame first, then amortizing frames above the floor.
		assert_eq!(sizes[0], (4.0 * base).round());
		for &size in &sizes[1..] {
			assert!(size >= (0.2 * base).floor());
			assert!(size < base);
		}

		// No frame hit the floor, so the window mean is the steady size.
		let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
		assert!((mean - base).abs() < 1.0);

		assert!(!codec.in_transient());
		codec.advance();
		assert_eq!(codec.current().payload.len() as f64, base.round());
	}

	#[test]
	fn transient_floor_overshoots_mean() {
		let config = StatisticsCodecConfig {
			fps: 25.0,
			transient_length: 4,
			..Default::default()
		};
		let mut codec = StatisticsCodec::with_noise(config, |size| size);
		codec.set_target_rate(400_000.0);
		run_for_a_second(&mut codec);

		codec.set_target_rate(800_000.0);
		let base: f64 = 800_000.0 / (8.0 * 25.0);

		let mut sizes = Vec::new();
		for _ in 0..4 {
			codec.advance();
			sizes.push(codec.current().payload.len() as f64);
		}

		// Amortizing 3x the base over 3 frames would zero them out; the
		// floor keeps them at 0.2x and the window mean overshoots.
		assert_eq!(sizes[0], (4.0 * base).round());
		for &size in &sizes[1..] {
			assert_eq!(size, (0.2 * base).round());
		}
		let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
		assert!(mean >= base);
	}

	#[test]
	fn updates_are_throttled() {
		let mut codec = quiet(25.0);
		codec.set_target_rate(500_000.0);

		// A second update within the interval is rejected outright.
		assert_eq!(codec.set_target_rate(520_000.0), 500_000.0);

		// 0.1 s at 25 fps is 2.5 frames; after 3 the throttle has expired.
		codec.advance();
		codec.advance();
		codec.advance();
		assert_eq!(codec.set_target_rate(520_000.0), 520_000.0);
	}

	#[test]
	fn moderate_changes_are_clamped() {
		let mut codec = quiet(25.0);
		codec.set_target_rate(500_000.0);
		run_for_a_second(&mut codec);

		// +30% is above the 10% update ratio but below the 50% big-change
		// ratio: adopted as +10%, no transient.
		assert_eq!(codec.set_target_rate(650_000.0), 550_000.0);
		assert!(!codec.in_transient());

		run_for_a_second(&mut codec);
		assert_eq!(codec.set_target_rate(495_000.0), 495_000.0);
	}

	#[test]
	fn downward_clamp() {
		let mut codec = quiet(25.0);
		codec.set_target_rate(500_000.0);
		run_for_a_second(&mut codec);

		assert_eq!(codec.set_target_rate(400_000.0), 450_000.0);
	}

	#[test]
	fn rejects_nonpositive_rates() {
		let mut codec = quiet(25.0);
		let adopted = codec.set_target_rate(500_000.0);
		assert_eq!(codec.set_target_rate(-5.0), adopted);
		assert_eq!(codec.set_target_rate(0.0), adopted);
	}

	#[test]
	fn seeded_noise_is_reproducible() {
		let config = StatisticsCodecConfig::default();

		let mut sizes = [Vec::new(), Vec::new()];
		for run in &mut sizes {
			let mut codec = StatisticsCodec::with_seed(config.clone(), 7);
			codec.set_target_rate(500_000.0);
			for _ in 0..20 {
				codec.advance();
				run.push(codec.current().payload.len());
			}
		}

		assert_eq!(sizes[0], sizes[1]);
	}

	#[test]
	fn default_noise_stays_in_band() {
		let mut codec = StatisticsCodec::new(25.0);
		codec.set_target_rate(500_000.0);
		run_for_a_second(&mut codec);

		for _ in 0..100 {
			codec.advance();
			let size = codec.current().payload.len() as f64;
			assert!(size >= 2500.0 * (1.0 - RAND_UNIFORM_MAX_RATIO) - 1.0);
			assert!(size <= 2500.0 * (1.0 + RAND_UNIFORM_MAX_RATIO) + 1.0);
		}
	}
}
