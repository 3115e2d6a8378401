//! Writes rendered engine signals into WAV files.

use std::path::Path;

use crate::{utils::buffer::planar_to_interleaved, Error};

// -------------------------------------------------------------------------------------------------

/// Write the given planar channel signals as 32-bit float WAV file.
///
/// All channels should have the same length: the shortest channel defines the file's length.
pub fn write_wav_file<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: &[&[f32]],
) -> Result<(), Error> {
    if channels.is_empty() || channels.len() > u16::MAX as usize {
        return Err(Error::ParameterError(format!(
            "Invalid WAV channel count: {}",
            channels.len()
        )));
    }
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut interleaved = Vec::new();
    planar_to_interleaved(channels, &mut interleaved);

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    log::debug!(
        "Wrote {} channel WAV file '{}'",
        channels.len(),
        path.as_ref().display()
    );
    Ok(())
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_file_round_trip() {
        let path = std::env::temp_dir().join("grainline-wav-test.wav");
        let left = [0.0, 0.5, -0.5, 1.0];
        let right = [1.0, -1.0, 0.25, 0.0];
        write_wav_file(&path, 44100, &[&left, &right]).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
        let samples = reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(samples, vec![0.0, 1.0, 0.5, -1.0, -0.5, 0.25, 1.0, 0.0]);
        let _ = std::fs::remove_file(&path);

        assert!(write_wav_file(&path, 44100, &[]).is_err());
    }
}
