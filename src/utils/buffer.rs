// -------------------------------------------------------------------------------------------------

/// Set all samples in the given buffer to zero.
#[inline]
pub fn clear_buffer(buffer: &mut [f32]) {
    buffer.fill(0.0);
}

/// Set all samples in the given optional buffer to `value`.
#[inline]
pub fn fill_optional_buffer(buffer: Option<&mut [f32]>, value: f32) {
    if let Some(buffer) = buffer {
        buffer.fill(value);
    }
}

// -------------------------------------------------------------------------------------------------

/// Copy the given planar channel slices into an interleaved buffer.
/// The shortest planar channel defines the number of copied frames.
pub fn planar_to_interleaved(planar: &[&[f32]], interleaved: &mut Vec<f32>) {
    let channel_count = planar.len();
    let frame_count = planar.iter().map(|c| c.len()).min().unwrap_or(0);
    interleaved.clear();
    interleaved.reserve(frame_count * channel_count);
    match channel_count {
        1 => {
            interleaved.extend_from_slice(&planar[0][..frame_count]);
        }
        2 => {
            for (l, r) in planar[0].iter().zip(planar[1].iter()) {
                interleaved.push(*l);
                interleaved.push(*r);
            }
        }
        _ => {
            for frame_index in 0..frame_count {
                for channel in planar {
                    interleaved.push(channel[frame_index]);
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
