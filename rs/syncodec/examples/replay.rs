// cargo run --example replay
use syncodec::{Codec, ShapedPacketizer, StatisticsCodec, StatisticsCodecConfig};

// Drive a statistics codec through a packetizer the way a congestion
// controller would: pull a fragment, account its wire size, adjust the rate.
// Time is virtual; a real testbed would sleep on each delay instead.
fn main() {
	let codec = StatisticsCodec::with_seed(StatisticsCodecConfig::default(), 42);
	let mut packetizer = ShapedPacketizer::new(codec, 1200, 40);
	packetizer.set_target_rate(500_000.0);

	let mut clock = 0.0;
	let mut wire_bytes = 0usize;

	while clock < 2.0 {
		packetizer.advance();
		let frame = packetizer.current();

		wire_bytes += frame.payload.len() + 40;
		clock += frame.delay;

		println!("{clock:8.4}s  {:5} bytes  rate {:7.0} bps", frame.payload.len(), packetizer.target_rate());

		// Halfway through, pretend the controller detected congestion.
		if (1.0..1.0 + frame.delay).contains(&clock) {
			packetizer.set_target_rate(250_000.0);
		}
	}

	println!("wire rate: {:.0} bps", wire_bytes as f64 * 8.0 / clock);
}
