//! Fractional sample fetches from interleaved sample buffers.

use assume::assume;

// -------------------------------------------------------------------------------------------------

/// Read a linearly interpolated sample at `sample_index + fraction` frames from the given
/// interleaved `samples`.
///
/// `sample_index` addresses a sample within an interleaved frame (`frame * channel_stride +
/// channel`). The neighbour sample is taken from the next frame and wraps around at the end of
/// the buffer, so the last frame blends into the first one.
///
/// Returns the sample at `sample_index` unchanged when `fraction` is `0.0`.
#[inline]
pub fn interpolate_linear(
    samples: &[f32],
    sample_index: usize,
    fraction: f64,
    frame_count: usize,
    channel_stride: usize,
) -> f32 {
    let len = samples.len().min(frame_count * channel_stride);
    debug_assert!(len > 0, "Expecting a non empty sample buffer");
    if len == 0 {
        return 0.0;
    }
    let mut index = sample_index;
    while index >= len {
        index -= len;
    }
    let mut next_index = index + channel_stride;
    while next_index >= len {
        next_index -= len;
    }

    assume!(unsafe: index < samples.len());
    let sample1 = samples[index] as f64;
    assume!(unsafe: next_index < samples.len());
    let sample2 = samples[next_index] as f64;

    (sample1 + fraction * (sample2 - sample1)) as f32
}

/// Read the sample at `sample_index` without interpolation. See [`interpolate_linear`].
#[inline]
pub fn interpolate_none(
    samples: &[f32],
    sample_index: usize,
    frame_count: usize,
    channel_stride: usize,
) -> f32 {
    let len = samples.len().min(frame_count * channel_stride);
    debug_assert!(len > 0, "Expecting a non empty sample buffer");
    if len == 0 {
        return 0.0;
    }
    let mut index = sample_index;
    while index >= len {
        index -= len;
    }
    assume!(unsafe: index < samples.len());
    samples[index]
}

// -------------------------------------------------------------------------------------------------

/// Wrap a read position in frames into the range `[0, frame_count)`.
///
/// Equivalent to repeatedly adding or subtracting `frame_count`, so overshoots of any size,
/// not only a single wraparound, land within the buffer.
#[inline]
pub fn wrap_position(position: f64, frame_count: f64) -> f64 {
    debug_assert!(frame_count > 0.0, "Expecting a non empty buffer");
    if (0.0..frame_count).contains(&position) {
        return position;
    }
    let wrapped = position.rem_euclid(frame_count);
    // rem_euclid may round tiny negative positions up to `frame_count`
    if wrapped >= frame_count {
        wrapped - frame_count
    } else {
        wrapped
    }
}

/// Split a non negative read position into its integer frame index and fractional part.
#[inline]
pub fn split_position(position: f64) -> (usize, f64) {
    debug_assert!(position >= 0.0, "Expecting a positive read position");
    let index = position as usize;
    (index, position - index as f64)
}

// -------------------------------------------------------------------------------------------------
