//! Sampling stride policy.
//!
//! The stride is chosen from the reported frame rate in two bands:
//! slow sources keep every fifth frame, fast sources every tenth.
//! Rates strictly between 15 and 25 fall in neither band: no stride
//! is set and no frames are selected from such a file. That gap is
//! long-standing documented behavior; callers surface it through an
//! event rather than papering over it here.

/// Stride for sources reporting at most 15 fps.
pub const LOW_RATE_STRIDE: u32 = 5;
/// Stride for sources reporting at least 25 fps.
pub const HIGH_RATE_STRIDE: u32 = 10;

/// Returns the sampling stride for a reported frame rate, or `None`
/// when the rate falls in the policy gap.
pub fn stride_for_rate(frame_rate: f64) -> Option<u32> {
    if frame_rate <= 15.0 {
        Some(LOW_RATE_STRIDE)
    } else if frame_rate >= 25.0 {
        Some(HIGH_RATE_STRIDE)
    } else {
        None
    }
}
