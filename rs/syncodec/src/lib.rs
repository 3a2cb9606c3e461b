//! # syncodec: synthetic video codecs for congestion control experiments
//!
//! A synthetic codec emits a lazy, rate-adaptive sequence of [Frame]s without
//! performing any actual video encoding. Payload *sizes* and inter-frame
//! delays are meaningful; payload bytes are zeroed. Congestion controllers
//! inside simulators or testbeds pull one frame at a time through the
//! [Codec] contract and schedule time however they like, so the library
//! never sleeps or blocks after construction.
//!
//! The family consists of:
//!
//! - **[PerfectCodec]**: fixed-size packets at a cadence matching the target rate.
//! - **[SimpleFpsCodec]**: one frame per 1/fps, sized from the target rate.
//! - **[TraceCodec]**: replays pre-encoded trace files, picking the trace and
//!   resolution that best match the target rate.
//! - **[ScalingTraceCodec]**: like [TraceCodec], but interpolates between
//!   adjacent trace bitrates for smooth output.
//! - **[StatisticsCodec]**: a steady/transient state machine with I-frame
//!   bursts and pluggable noise.
//! - **[ShapedPacketizer]**: wraps any codec and slices its frames into
//!   MTU-bounded fragments spread evenly over the inter-frame interval.
mod codec;
mod error;
mod frame;
mod perfect;
mod shaped;
mod simple;
mod stats;

/// The catalog indexes a directory of pre-encoded trace files.
pub mod catalog;

/// The trace-driven codecs replaying catalog sequences.
pub mod trace;

/// Export the trace reader we use.
pub use syncodec_trace;

pub use catalog::{Resolution, TraceCatalog};
pub use codec::*;
pub use error::*;
pub use frame::*;
pub use perfect::*;
pub use shaped::*;
pub use simple::*;
pub use stats::*;
pub use trace::{ScalingTraceCodec, TraceCodec};
