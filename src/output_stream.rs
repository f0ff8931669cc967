use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::BufferSize;
use midisquare::{MidiError, RenderSource};

/// Opens the default output device and plays `source` on every channel.
pub fn new_output_stream<R: RenderSource + 'static>(
    mut source: R,
    sample_rate: u32,
    buffer_frames: u32,
) -> Result<cpal::Stream, MidiError> {
    // Initialize audio output
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| MidiError::AudioError("No output device available".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|err| MidiError::AudioError(err.to_string()))?;
    if !config.sample_format().is_float() {
        return Err(MidiError::AudioError(format!(
            "Unsupported sample format {}",
            config.sample_format()
        )));
    }
    let channels_count = usize::from(config.channels());
    let stream_config = cpal::StreamConfig {
        channels: config.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: BufferSize::Fixed(buffer_frames),
    };
    log::info!(
        "Opening output stream: {channels_count} channels, {sample_rate} Hz, {buffer_frames} frames"
    );

    // reuse mono buffer across all calls, with room for hosts ignoring the fixed size
    let mut mono: Vec<f32> = vec![0_f32; buffer_frames as usize * 2];

    let err_fn = |err| log::error!("an error occurred on stream: {err}");

    let stream = device
        .build_output_stream(
            &stream_config,
            move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frame_count = output.len() / channels_count;
                if mono.len() < frame_count {
                    log::warn!("Buffer too small, skipping audio rendering");
                    output.fill(0.0);
                    return;
                }
                let mono = &mut mono[..frame_count];
                source.render(mono);

                // Copy the mono signal to every channel of the frame.
                for (frame, sample) in output.chunks_exact_mut(channels_count).zip(mono.iter()) {
                    frame.fill(*sample);
                }
            },
            err_fn,
            None, // blocking stream
        )
        .map_err(|err| MidiError::AudioError(err.to_string()))?;
    stream
        .play()
        .map_err(|err| MidiError::AudioError(err.to_string()))?;
    Ok(stream)
}
