use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::Error;

/// A symbolic video resolution, in canonical ascending order.
///
/// The discriminants define the ladder the adaptive codecs climb: one label
/// up or down per step. The order is by pixel count, not by label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Resolution {
	R90p = 0,
	R180p = 1,
	R240p = 2,
	R360p = 3,
	R480p = 4,
	R540p = 5,
	R720p = 6,
	R1080p = 7,
}

impl Resolution {
	/// Every resolution, smallest to largest.
	pub const ALL: [Resolution; 8] = [
		Self::R90p,
		Self::R180p,
		Self::R240p,
		Self::R360p,
		Self::R480p,
		Self::R540p,
		Self::R720p,
		Self::R1080p,
	];

	/// The frame dimensions in pixels, width then height.
	pub fn size(self) -> (u32, u32) {
		match self {
			Self::R90p => (160, 90),
			Self::R180p => (320, 180),
			Self::R240p => (352, 240),
			Self::R360p => (640, 360),
			Self::R480p => (640, 480),
			Self::R540p => (960, 540),
			Self::R720p => (1280, 720),
			Self::R1080p => (1920, 1080),
		}
	}

	/// Frame width in pixels.
	pub fn width(self) -> u32 {
		self.size().0
	}

	/// Frame height in pixels.
	pub fn height(self) -> u32 {
		self.size().1
	}

	/// Total pixels per frame.
	pub fn pixels(self) -> u64 {
		let (w, h) = self.size();
		w as u64 * h as u64
	}

	/// The label used in trace file names, e.g. `"720p"`.
	pub fn label(self) -> &'static str {
		match self {
			Self::R90p => "90p",
			Self::R180p => "180p",
			Self::R240p => "240p",
			Self::R360p => "360p",
			Self::R480p => "480p",
			Self::R540p => "540p",
			Self::R720p => "720p",
			Self::R1080p => "1080p",
		}
	}

	/// The next larger resolution, if any.
	pub fn up(self) -> Option<Resolution> {
		Self::try_from(u8::from(self) + 1).ok()
	}

	/// The next smaller resolution, if any.
	pub fn down(self) -> Option<Resolution> {
		u8::from(self).checked_sub(1).and_then(|index| Self::try_from(index).ok())
	}
}

impl fmt::Display for Resolution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for Resolution {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|resolution| resolution.label() == s)
			.ok_or_else(|| Error::UnknownResolution(s.to_string()))
	}
}
