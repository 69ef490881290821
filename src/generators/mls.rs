//! Maximum length sequences
//!
//! A Galois LFSR of order k cycles through all 2^k − 1 non-zero states, and
//! the bits it shifts out form a sequence whose circular autocorrelation is
//! N at lag 0 and −1 everywhere else.

use crate::engine::SampleBuffer;
use crate::error::{Result, SignalError};
use crate::progress::{tick, Progress};

pub const MIN_ORDER: u32 = 10;
pub const MAX_ORDER: u32 = 18;

/// Feedback taps of a primitive polynomial for each supported order
const TAPS: [(u32, &[u32]); 9] = [
    (10, &[10, 7]),
    (11, &[11, 9]),
    (12, &[12, 6, 4, 1]),
    (13, &[13, 4, 3, 1]),
    (14, &[14, 5, 3, 1]),
    (15, &[15, 14]),
    (16, &[16, 15, 13, 4]),
    (17, &[17, 14]),
    (18, &[18, 11]),
];

/// Galois feedback mask for `order`
fn feedback_mask(order: u32) -> Result<u32> {
    TAPS.iter()
        .find(|(o, _)| *o == order)
        .map(|(_, taps)| taps.iter().fold(0u32, |mask, t| mask | 1 << (t - 1)))
        .ok_or(SignalError::UnsupportedOrder { order })
}

/// Period of the sequence for `order`, `2^order − 1`
pub fn sequence_length(order: u32) -> usize {
    (1usize << order) - 1
}

/// Generate `periods` back-to-back copies of the order-`order` MLS as ±1.0
pub fn mls(order: u32, periods: u32, progress: &mut dyn Progress) -> Result<SampleBuffer> {
    let mask = feedback_mask(order)?;
    let len = sequence_length(order);
    let periods = periods.max(1) as usize;
    let total = len * periods;

    let mut out = Vec::with_capacity(total);
    let mut state: u32 = (1 << order) - 1;
    for i in 0..len {
        tick(progress, i, total);
        let bit = state & 1;
        state >>= 1;
        if bit == 1 {
            state ^= mask;
        }
        out.push(if bit == 1 { -1.0 } else { 1.0 });
    }

    for p in 1..periods {
        out.extend_from_within(0..len);
        progress.report((p + 1) as f64 / periods as f64);
    }
    progress.report(1.0);
    Ok(out)
}
