//! Sine lookup table for the OOK carrier
//!
//! 256 entries over one cycle, i8 amplitude. Index 64 is 90°, so the
//! cosine of index `i` is `SINE_LUT[i + 64]`.

pub const LUT_SIZE: usize = 256;

pub static SINE_LUT: [i8; LUT_SIZE] = {
    let mut table = [0i8; LUT_SIZE];
    let mut i = 0;
    while i < LUT_SIZE {
        let angle =
            (i as f64) * core::f64::consts::PI * 2.0 / (LUT_SIZE as f64);
        table[i] = (const_sin(angle) * 127.0) as i8;
        i += 1;
    }
    table
};

/// Taylor series sine, usable in const context
const fn const_sin(x: f64) -> f64 {
    let mut x = x;
    while x > core::f64::consts::PI {
        x -= 2.0 * core::f64::consts::PI;
    }
    while x < -core::f64::consts::PI {
        x += 2.0 * core::f64::consts::PI;
    }

    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;
    let x11 = x9 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0
        - x11 / 39916800.0
}

/// Phase step for `freq_hz` at `sample_rate`, in 1/2^32 of a cycle
pub fn phase_increment(freq_hz: u32, sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        return 0;
    }
    ((freq_hz as u64) << 32)
        .checked_div(sample_rate as u64)
        .map_or(0, |inc| inc as u32)
}

/// (cos, sin) at the top 8 bits of `phase`
#[inline]
pub fn iq_at(phase: u32) -> (i8, i8) {
    let idx = (phase >> 24) as u8;
    (
        SINE_LUT[idx.wrapping_add(64) as usize],
        SINE_LUT[idx as usize],
    )
}
