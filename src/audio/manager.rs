//! Web Audio playback
//!
//! The song is rendered once on first use and kept as an `AudioBuffer`.
//! Every start creates a fresh looping source from the top.

use web_sys::{
    AudioBuffer, AudioBufferSourceNode, AudioContext, GainNode, OscillatorNode, OscillatorType,
};

use super::SoundEffect;
use super::composition::SONG;
use super::synth::{SAMPLE_RATE, noise_burst, render_song};
use crate::settings::Settings;

/// Audio manager for the game page
pub struct AudioManager {
    ctx: Option<AudioContext>,
    music_buffer: Option<AudioBuffer>,
    impact_buffer: Option<AudioBuffer>,
    music: Option<(AudioBufferSourceNode, GainNode)>,
    /// Effective gains, zero while muted
    music_gain: f32,
    sfx_gain: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            music_buffer: None,
            impact_buffer: None,
            music: None,
            music_gain: Settings::default().music_gain(),
            sfx_gain: Settings::default().sfx_gain(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.music_gain = settings.music_gain();
        self.sfx_gain = settings.sfx_gain();
        if let Some((_, gain)) = &self.music {
            gain.gain().set_value(self.music_gain);
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.is_some()
    }

    /// Start or stop the loop to match `should_play`
    pub fn sync_music(&mut self, should_play: bool) {
        match (should_play, self.is_music_playing()) {
            (true, false) => self.start_music(),
            (false, true) => self.stop_music(),
            _ => {}
        }
    }

    pub fn start_music(&mut self) {
        if self.music_gain <= 0.0 || self.music.is_some() {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        self.resume();
        let Some(buffer) = self.music_buffer(&ctx) else {
            return;
        };
        let Some(nodes) = Self::looping_source(&ctx, &buffer, self.music_gain) else {
            log::warn!("Could not start music");
            return;
        };
        self.music = Some(nodes);
        log::debug!("Music started");
    }

    pub fn stop_music(&mut self) {
        if let Some((source, gain)) = self.music.take() {
            source.stop().ok();
            gain.disconnect().ok();
            log::debug!("Music stopped");
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.sfx_gain;
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        self.resume();

        match effect {
            SoundEffect::Shoot => self.play_shoot(&ctx, vol),
            SoundEffect::Impact => self.play_impact(&ctx, vol),
        }
    }

    /// Rendered once, then reused
    fn music_buffer(&mut self, ctx: &AudioContext) -> Option<AudioBuffer> {
        if self.music_buffer.is_none() {
            let samples = render_song(&SONG);
            log::info!("Rendered soundtrack: {} samples", samples.len());
            self.music_buffer = Self::to_buffer(ctx, samples);
        }
        self.music_buffer.clone()
    }

    fn to_buffer(ctx: &AudioContext, mut samples: Vec<f32>) -> Option<AudioBuffer> {
        let len = u32::try_from(samples.len()).ok()?;
        let buffer = ctx.create_buffer(1, len.max(1), SAMPLE_RATE as f32).ok()?;
        buffer.copy_to_channel(&mut samples, 0).ok()?;
        Some(buffer)
    }

    fn looping_source(
        ctx: &AudioContext,
        buffer: &AudioBuffer,
        vol: f32,
    ) -> Option<(AudioBufferSourceNode, GainNode)> {
        let source = ctx.create_buffer_source().ok()?;
        let gain = ctx.create_gain().ok()?;
        source.set_buffer(Some(buffer));
        source.set_loop(true);
        gain.gain().set_value(vol);
        source.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        source.start().ok()?;
        Some((source, gain))
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Shot - short descending square blip
    fn play_shoot(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.12, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.1)
            .ok();
        osc.frequency().set_value_at_time(1200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(300.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.12).ok();
    }

    /// Impact - decaying noise burst
    fn play_impact(&mut self, ctx: &AudioContext, vol: f32) {
        if self.impact_buffer.is_none() {
            self.impact_buffer = Self::to_buffer(ctx, noise_burst(0.25, 0x1A7E));
        }
        let Some(buffer) = &self.impact_buffer else {
            return;
        };
        let Some(source) = ctx.create_buffer_source().ok() else {
            return;
        };
        let Some(gain) = ctx.create_gain().ok() else {
            return;
        };
        let t = ctx.current_time();

        source.set_buffer(Some(buffer));
        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.25)
            .ok();
        if source.connect_with_audio_node(&gain).is_err()
            || gain.connect_with_audio_node(&ctx.destination()).is_err()
        {
            return;
        }
        source.start().ok();
    }
}
