use fundsp::prelude::*;
use rodio::{OutputStream, OutputStreamHandle, Sink, buffer::SamplesBuffer};
use tracing::{info, warn};

const SAMPLE_RATE: u32 = 44_100;

// ── Synthesis ───────────────────────────────────────────────────────────────

/// Render `seconds` of a mono graph into a sample buffer.
fn render<X>(mut sound: An<X>, seconds: f32) -> Vec<f32>
where
    X: AudioNode<Inputs = U0, Outputs = U1>,
{
    sound.set_sample_rate(SAMPLE_RATE as f64);
    let len = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..len).map(|_| sound.get_mono()).collect()
}

/// Falling sawtooth, 400 Hz to 80 Hz over 0.4 s, silent by 0.5 s.
fn death_samples() -> Vec<f32> {
    let freq = lfo(|t: f32| lerp(400.0, 80.0, (t / 0.4).min(1.0)));
    let gain = lfo(|t: f32| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
    render((freq >> saw()) * gain, 0.5)
}

/// Short rising chirp for a flap.
fn flap_samples() -> Vec<f32> {
    let freq = lfo(|t: f32| lerp(500.0, 900.0, (t / 0.08).min(1.0)));
    let gain = lfo(|t: f32| lerp(0.12, 0.0, (t / 0.1).min(1.0)));
    render((freq >> sine::<f32>()) * gain, 0.1)
}

/// Two quick square blips, a fifth apart, for passing an obstacle.
fn point_samples() -> Vec<f32> {
    let freq = lfo(|t: f32| if t < 0.05 { 660.0_f32 } else { 990.0 });
    let gain = lfo(|t: f32| lerp(0.08, 0.0, (t / 0.12).min(1.0)));
    render((freq >> square()) * gain, 0.12)
}

// ── Playback ────────────────────────────────────────────────────────────────

/// Output device handle. Without one every effect is a silent no-op.
pub struct Audio {
    // The stream must outlive every sink played on its handle.
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl Audio {
    pub fn open(mute: bool) -> Self {
        if mute {
            info!("sound muted");
            return Self::silent();
        }
        match OutputStream::try_default() {
            Ok(output) => Self {
                output: Some(output),
            },
            Err(err) => {
                warn!(%err, "no audio output, sound disabled");
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self { output: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    pub fn flap(&self) {
        self.play(flap_samples);
    }

    pub fn point(&self) {
        self.play(point_samples);
    }

    pub fn death(&self) {
        self.play(death_samples);
    }

    fn play(&self, samples: fn() -> Vec<f32>) {
        let Some((_, handle)) = &self.output else {
            return;
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples()));
                sink.detach(); // Play in background
            }
            Err(err) => warn!(%err, "could not start sound"),
        }
    }
}
