//! Real-world scenario benchmarks.
//!
//! These drive a whole instrument the way the timer interrupt would,
//! with the control queue fed between ticks.

mod instrument;

pub use instrument::bench_instrument;
