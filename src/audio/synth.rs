//! Offline chiptune renderer
//!
//! Renders a `Song` into mono `f32` samples. Deterministic: the noise
//! channel uses a fixed-seed PCG, so the same song always yields the same
//! buffer. Note tails that run past the end wrap to the start, so the
//! buffer loops without a click.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::composition::{
    BPM, Drum, NoteEvent, SECTION_STEPS, STEPS_PER_BEAT, Song, midi_to_freq, parse_drums,
    parse_track,
};

pub const SAMPLE_RATE: u32 = 22050;
/// Loudest sample after normalization
pub const PEAK: f32 = 0.8;
const NOISE_SEED: u64 = 0x5EED_0F_57A2;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wave {
    /// Pulse with the given duty cycle (0.5 = square)
    Pulse(f32),
    Triangle,
    Sine,
}

impl Wave {
    /// Sample at `phase` in [0, 1)
    fn sample(self, phase: f32) -> f32 {
        match self {
            Wave::Pulse(duty) => {
                if phase < duty {
                    1.0
                } else {
                    -1.0
                }
            }
            Wave::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
            Wave::Sine => (phase * std::f32::consts::TAU).sin(),
        }
    }
}

/// Linear attack, exponential decay, short release after note-off
#[derive(Debug, Clone, Copy)]
struct Voice {
    wave: Wave,
    gain: f32,
    attack_s: f32,
    decay_s: f32,
}

const LEAD: Voice = Voice {
    wave: Wave::Pulse(0.5),
    gain: 0.22,
    attack_s: 0.005,
    decay_s: 0.35,
};
const BASS: Voice = Voice {
    wave: Wave::Triangle,
    gain: 0.4,
    attack_s: 0.004,
    decay_s: 0.25,
};
const ARP: Voice = Voice {
    wave: Wave::Pulse(0.25),
    gain: 0.09,
    attack_s: 0.002,
    decay_s: 0.07,
};
const RELEASE_S: f32 = 0.03;

/// Samples per sixteenth step
pub fn step_samples() -> usize {
    let secs = 60.0 / BPM / STEPS_PER_BEAT as f32;
    (secs * SAMPLE_RATE as f32).round() as usize
}

/// Exact loop length for `song`
pub fn song_len_samples(song: &Song) -> usize {
    song.total_steps() * step_samples()
}

/// Render the whole song into a seamless loop, peak-normalized to `PEAK`
pub fn render_song(song: &Song) -> Vec<f32> {
    let len = song_len_samples(song);
    let mut out = vec![0.0; len];
    if len == 0 {
        return out;
    }
    let step = step_samples();
    let mut rng = Pcg32::seed_from_u64(NOISE_SEED);

    for (i, section) in song.arrangement().enumerate() {
        let origin = i * SECTION_STEPS * step;
        for (pattern, voice) in [
            (section.lead, LEAD),
            (section.bass, BASS),
            (section.arp, ARP),
        ] {
            for note in parse_track(pattern) {
                render_note(&mut out, origin, step, &note, voice);
            }
        }
        for hit in parse_drums(section.drums) {
            let start = origin + hit.step * step;
            match hit.drum {
                Drum::Kick => render_kick(&mut out, start),
                Drum::Snare => render_noise(&mut out, start, &mut rng, 0.12, 0.05, 0.3),
                Drum::Hat => render_noise(&mut out, start, &mut rng, 0.04, 0.012, 0.1),
            }
        }
    }

    normalize(&mut out, PEAK);
    out
}

/// Mix into `out` at `start + i`, wrapping past the end
fn mix(out: &mut [f32], start: usize, i: usize, value: f32) {
    let len = out.len();
    out[(start + i) % len] += value;
}

fn render_note(out: &mut [f32], origin: usize, step: usize, note: &NoteEvent, voice: Voice) {
    let rate = SAMPLE_RATE as f32;
    let freq = midi_to_freq(note.midi);
    let start = origin + note.step * step;
    let gate = note.len * step;
    let total = gate + (RELEASE_S * rate) as usize;
    let attack = (voice.attack_s * rate).max(1.0);

    for i in 0..total {
        let t = i as f32 / rate;
        let mut env = if (i as f32) < attack {
            i as f32 / attack
        } else {
            (-(t - voice.attack_s) / voice.decay_s).exp()
        };
        if i >= gate {
            env *= (-((i - gate) as f32 / rate) / (RELEASE_S / 4.0)).exp();
        }
        let phase = (freq * t).fract();
        mix(out, start, i, voice.wave.sample(phase) * env * voice.gain);
    }
}

/// Sine with a fast downward pitch sweep
fn render_kick(out: &mut [f32], start: usize) {
    let rate = SAMPLE_RATE as f32;
    let total = (0.15 * rate) as usize;
    let mut phase = 0.0f32;
    for i in 0..total {
        let t = i as f32 / rate;
        let freq = 50.0 + 100.0 * (-t / 0.03).exp();
        phase = (phase + freq / rate).fract();
        let env = (-t / 0.08).exp();
        mix(out, start, i, Wave::Sine.sample(phase) * env * 0.6);
    }
}

fn render_noise(out: &mut [f32], start: usize, rng: &mut Pcg32, len_s: f32, decay_s: f32, gain: f32) {
    let rate = SAMPLE_RATE as f32;
    let total = (len_s * rate) as usize;
    for i in 0..total {
        let t = i as f32 / rate;
        let env = (-t / decay_s).exp();
        let noise = rng.random::<f32>() * 2.0 - 1.0;
        mix(out, start, i, noise * env * gain);
    }
}

/// Scale so the loudest sample hits `peak`
pub fn normalize(samples: &mut [f32], peak: f32) {
    let max = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        let scale = peak / max;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

/// Decaying white noise, the damage effect
pub fn noise_burst(duration_s: f32, seed: u64) -> Vec<f32> {
    let rate = SAMPLE_RATE as f32;
    let total = (duration_s.max(0.0) * rate) as usize;
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..total)
        .map(|i| {
            let t = i as f32 / rate;
            let env = (-t / (duration_s / 5.0)).exp();
            (rng.random::<f32>() * 2.0 - 1.0) * env
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::composition::SONG;

    #[test]
    fn test_step_is_a_sixteenth_at_150_bpm() {
        assert_eq!(step_samples(), 2205);
        assert_eq!(song_len_samples(&SONG), 6 * 32 * 2205);
    }

    #[test]
    fn test_render_is_exact_bounded_and_deterministic() {
        let a = render_song(&SONG);
        assert_eq!(a.len(), song_len_samples(&SONG));
        let peak = a.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - PEAK).abs() < 1e-4);
        assert!(a.iter().all(|s| s.is_finite() && (-1.0..=1.0).contains(s)));

        let b = render_song(&SONG);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tails_wrap_to_start() {
        // Single held note on the very last step of a one-section song
        const TAIL: Song = Song {
            sections: &[crate::audio::composition::Section {
                lead: ". . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . C5",
                bass: ". . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . .",
                arp: ". . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . .",
                drums: ". . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . .",
            }],
            order: &[0],
        };
        let out = render_song(&TAIL);
        let wrapped = out[..100].iter().any(|s| s.abs() > 0.0);
        assert!(wrapped, "release tail should land at the start of the loop");
    }

    #[test]
    fn test_noise_burst_decays() {
        let burst = noise_burst(0.2, 7);
        assert_eq!(burst.len(), (0.2 * SAMPLE_RATE as f32) as usize);
        let head: f32 = burst[..400].iter().map(|s| s.abs()).sum();
        let tail: f32 = burst[burst.len() - 400..].iter().map(|s| s.abs()).sum();
        assert!(head > tail * 10.0);
        assert_eq!(noise_burst(0.2, 7), burst);
    }
}
