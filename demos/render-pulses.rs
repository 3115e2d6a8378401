//! Renders a pulse triggered grain stream into a WAV file.
//!
//! Usage: `cargo run --example render-pulses [OUTPUT_PATH]`

use std::f32::consts::PI;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use grainline::{
    utils::wav::write_wav_file, BufferStorage, Error, GrainEngine, GrainEngineOptions,
    GrainEvent, SampleData, SignalConnections, SignalInputs, SignalOutputs,
};

// -------------------------------------------------------------------------------------------------

const SAMPLE_RATE: u32 = 44100;
const BLOCK_SIZE: usize = 256;
const DURATION_SECS: usize = 4;

/// Grain settings (tweak as needed!)
const GRAIN_LENGTH_MS: f64 = 80.0;
const GRAIN_PITCH: f64 = 1.5;
const PULSE_INTERVAL_MS: usize = 90;
const WINDOW_SIZE: usize = 1024;

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("Failed to set logger");

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "render-pulses.wav".to_string());

    // Create source buffers: a two octave sine sweep and a hann window
    let storage = BufferStorage::new();
    let sound_frames = SAMPLE_RATE as usize * 2;
    let mut phase = 0.0f32;
    let sweep = (0..sound_frames)
        .map(|frame| {
            let freq = 220.0 * 4.0f32.powf(frame as f32 / sound_frames as f32);
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
            phase.sin() * 0.5
        })
        .collect::<Vec<_>>();
    storage.insert("sweep", SampleData::mono(sweep, SAMPLE_RATE)?)?;
    storage.insert(
        "hann",
        SampleData::from_fn(WINDOW_SIZE, 1, SAMPLE_RATE, |frame, _| {
            0.5 - 0.5 * (2.0 * PI * frame as f32 / (WINDOW_SIZE - 1) as f32).cos()
        })?,
    )?;

    // Create the engine: start positions are driven by an audio-rate signal
    let (mut engine, handle) = GrainEngine::new(GrainEngineOptions::pulse_grains(), storage)?;
    log::info!("{}", handle.info());
    handle.set_sound_buffer("sweep")?;
    handle.set_window_buffer("hann")?;
    handle.set_length(GRAIN_LENGTH_MS)?;
    handle.set_pitch(GRAIN_PITCH)?;
    handle.set_gain(0.8)?;
    engine.prepare(SAMPLE_RATE, SignalConnections::none().start(true))?;

    // Create input signals
    let frame_count = SAMPLE_RATE as usize * DURATION_SECS;
    let pulse_interval = PULSE_INTERVAL_MS * SAMPLE_RATE as usize / 1000;
    let trigger = (0..frame_count)
        .map(|frame| if frame % pulse_interval == 0 { 1.0 } else { 0.0 })
        .collect::<Vec<_>>();
    let mut rng = SmallRng::seed_from_u64(0x6e41);
    let sound_length_ms = sound_frames as f32 * 1000.0 / SAMPLE_RATE as f32;
    let mut start = 0.0;
    let start_signal = (0..frame_count)
        .map(|frame| {
            if frame % pulse_interval == 0 {
                start = rng.random_range(0.0..sound_length_ms);
            }
            start
        })
        .collect::<Vec<_>>();

    // Render
    let mut output = vec![0.0; frame_count];
    let mut overflow = vec![0.0; frame_count];
    let mut grain_count = 0;
    for offset in (0..frame_count).step_by(BLOCK_SIZE) {
        let range = offset..(offset + BLOCK_SIZE).min(frame_count);
        let inputs = SignalInputs::none()
            .trigger(&trigger[range.clone()])
            .start(&start_signal[range.clone()]);
        let mut outputs =
            SignalOutputs::new(&mut output[range.clone()]).overflow(&mut overflow[range]);
        engine.process(&inputs, &mut outputs);

        for event in handle.events() {
            if let GrainEvent::Started { start, .. } = event {
                log::debug!("Grain started at {start:.1} ms");
                grain_count += 1;
            }
        }
    }
    log::info!("Rendered {grain_count} grains");
    if overflow.iter().any(|value| *value > 0.0) {
        log::warn!("Some pulses arrived while grains were still sounding");
    }

    write_wav_file(&output_path, SAMPLE_RATE, &[&output])?;
    log::info!("Wrote '{output_path}'");
    Ok(())
}
