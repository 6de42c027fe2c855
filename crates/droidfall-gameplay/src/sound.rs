//! Positional sound emitters driven by droid cues.
//!
//! This module provides:
//! - [`SoundConfig`] describing one emitter and the cues that start and stop it
//! - [`AudioBackend`], the seam to whatever plays buffers
//! - [`ListenerSlot`], the single listener shared by every emitter
//! - [`SoundBoard`], which keeps one emitter set per droid

use std::collections::HashMap;

use droidfall_common::{AgentId, TeardownError};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::cues::Cue;

// ============================================================================
// Errors and handles
// ============================================================================

/// Errors raised by sound emitters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The emitter has no source file.
    #[error("sound source is empty")]
    MissingSource,

    /// The backend could not load the source.
    #[error("failed to load {src}: {reason}")]
    LoadFailed {
        /// Source file
        src: String,
        /// Backend message
        reason: String,
    },

    /// The backend could not detach a source.
    #[error("failed to disconnect source: {0}")]
    Disconnect(String),
}

/// Backend handle of the audio listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerHandle(pub u32);

/// Backend handle of one positional source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHandle(pub u32);

// ============================================================================
// Configuration
// ============================================================================

/// One emitter: which file it plays and which cues drive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Audio file.
    pub src: String,
    /// Cue that starts playback.
    pub on: Cue,
    /// Cue that stops playback.
    pub off: Option<Cue>,
    /// Start playing as soon as the buffer is loaded.
    pub autoplay: bool,
    /// Loop playback.
    pub looping: bool,
    /// Gain in `[0, 1]`.
    pub volume: f32,
}

impl SoundConfig {
    /// Creates a one-shot emitter for `src` started by `on`.
    #[must_use]
    pub fn new(src: impl Into<String>, on: Cue) -> Self {
        Self {
            src: src.into(),
            on,
            off: None,
            autoplay: false,
            looping: false,
            volume: 1.0,
        }
    }

    /// Sets the cue that stops playback.
    #[must_use]
    pub fn with_off(mut self, off: Cue) -> Self {
        self.off = Some(off);
        self
    }

    /// Sets the gain.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Enables looping.
    #[must_use]
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Enables autoplay.
    #[must_use]
    pub fn autoplay(mut self) -> Self {
        self.autoplay = true;
        self
    }
}

/// Sounds attached to every droid.
#[must_use]
pub fn droid_sound_set() -> Vec<SoundConfig> {
    vec![
        SoundConfig::new("robots0.ogg", Cue::Appearing)
            .with_off(Cue::Charging)
            .with_volume(0.4),
        SoundConfig::new("whoosh0.ogg", Cue::Charging)
            .with_off(Cue::Shooting)
            .with_volume(0.5),
        SoundConfig::new("laser0.ogg", Cue::Shooting).with_volume(0.15),
        SoundConfig::new("explosion0.ogg", Cue::EnemyHit).with_volume(0.15),
    ]
}

// ============================================================================
// Backend
// ============================================================================

/// Playback backend.
pub trait AudioBackend {
    /// Creates the listener every source is attached to.
    fn create_listener(&mut self) -> ListenerHandle;

    /// Moves the listener.
    fn set_listener_position(&mut self, listener: ListenerHandle, position: Vec3);

    /// Creates a positional source attached to `listener`.
    fn create_source(&mut self, listener: ListenerHandle) -> SourceHandle;

    /// Loads `src` into a source.
    fn load(
        &mut self,
        source: SourceHandle,
        src: &str,
        looping: bool,
        volume: f32,
    ) -> Result<(), AudioError>;

    /// Starts playback.
    fn play(&mut self, source: SourceHandle);

    /// Stops playback and rewinds.
    fn stop(&mut self, source: SourceHandle);

    /// Pauses playback.
    fn pause(&mut self, source: SourceHandle);

    /// Whether a buffer is loaded.
    fn is_loaded(&self, source: SourceHandle) -> bool;

    /// Whether the source is playing.
    fn is_playing(&self, source: SourceHandle) -> bool;

    /// Detaches and frees a source.
    fn disconnect(&mut self, source: SourceHandle) -> Result<(), AudioError>;
}

/// Holds the one shared listener, created on first use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerSlot {
    listener: Option<ListenerHandle>,
}

impl ListenerSlot {
    /// Returns the listener, creating it on the first call.
    pub fn get_or_init<B: AudioBackend + ?Sized>(&mut self, backend: &mut B) -> ListenerHandle {
        *self.listener.get_or_insert_with(|| {
            debug!("audio listener created");
            backend.create_listener()
        })
    }

    /// The listener, if already created.
    #[must_use]
    pub fn get(&self) -> Option<ListenerHandle> {
        self.listener
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// One positional sound.
#[derive(Debug, Clone)]
pub struct SoundEmitter {
    config: SoundConfig,
    listener: ListenerHandle,
    source: SourceHandle,
}

impl SoundEmitter {
    /// Creates the source and loads its buffer.
    pub fn new<B: AudioBackend + ?Sized>(
        config: SoundConfig,
        listener: ListenerHandle,
        backend: &mut B,
    ) -> Result<Self, AudioError> {
        if config.src.is_empty() {
            warn!(cue = %config.on, "sound emitter without source");
            return Err(AudioError::MissingSource);
        }

        let source = backend.create_source(listener);
        let emitter = Self {
            config,
            listener,
            source,
        };
        if let Err(e) = emitter.load(backend) {
            if let Err(cleanup) = backend.disconnect(source) {
                warn!(src = %emitter.config.src, "audio source cleanup failed: {cleanup}");
            }
            return Err(e);
        }
        Ok(emitter)
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    /// Backend source handle.
    #[must_use]
    pub fn source(&self) -> SourceHandle {
        self.source
    }

    /// Applies a new configuration.
    ///
    /// A new `src` replaces the backend source. Other changes reload the
    /// existing one.
    pub fn reconfigure<B: AudioBackend + ?Sized>(
        &mut self,
        config: SoundConfig,
        backend: &mut B,
    ) -> Result<(), AudioError> {
        if config.src.is_empty() {
            warn!(cue = %config.on, "sound emitter without source");
            return Err(AudioError::MissingSource);
        }
        if config == self.config {
            return Ok(());
        }

        let src_changed = config.src != self.config.src;
        let reload = src_changed
            || config.looping != self.config.looping
            || (config.volume - self.config.volume).abs() > f32::EPSILON;
        self.config = config;

        if src_changed {
            if backend.is_playing(self.source) {
                backend.stop(self.source);
            }
            if let Err(e) = backend.disconnect(self.source) {
                warn!("replacing sound source: {e}");
            }
            self.source = backend.create_source(self.listener);
        }
        if reload {
            self.load(backend)?;
        }
        Ok(())
    }

    /// Plays or stops according to the emitter's cues.
    pub fn handle_cue<B: AudioBackend + ?Sized>(&self, cue: Cue, backend: &mut B) {
        if self.config.off == Some(cue) {
            self.stop(backend);
        }
        if self.config.on == cue {
            self.play(backend);
        }
    }

    /// Starts playback once the buffer is loaded.
    pub fn play<B: AudioBackend + ?Sized>(&self, backend: &mut B) {
        if !backend.is_loaded(self.source) {
            trace!(src = %self.config.src, "play before load ignored");
            return;
        }
        backend.play(self.source);
    }

    /// Stops playback once the buffer is loaded.
    pub fn stop<B: AudioBackend + ?Sized>(&self, backend: &mut B) {
        if backend.is_loaded(self.source) {
            backend.stop(self.source);
        }
    }

    /// Pauses a playing source.
    pub fn pause<B: AudioBackend + ?Sized>(&self, backend: &mut B) {
        if backend.is_playing(self.source) {
            backend.pause(self.source);
        }
    }

    /// Stops and detaches the source.
    pub fn remove<B: AudioBackend + ?Sized>(self, backend: &mut B) -> Result<(), AudioError> {
        if backend.is_playing(self.source) {
            backend.stop(self.source);
        }
        backend.disconnect(self.source).map_err(|e| {
            warn!(src = %self.config.src, "audio source removal failed: {e}");
            e
        })
    }

    fn load<B: AudioBackend + ?Sized>(&self, backend: &mut B) -> Result<(), AudioError> {
        backend.load(
            self.source,
            &self.config.src,
            self.config.looping,
            self.config.volume,
        )?;
        if self.config.autoplay {
            backend.play(self.source);
        }
        Ok(())
    }
}

// ============================================================================
// Sound board
// ============================================================================

/// Per-droid emitter sets on top of one backend.
#[derive(Debug)]
pub struct SoundBoard<B: AudioBackend> {
    backend: B,
    sounds: Vec<SoundConfig>,
    emitters: HashMap<AgentId, Vec<SoundEmitter>>,
}

impl<B: AudioBackend> SoundBoard<B> {
    /// Creates a board attaching `sounds` to every droid.
    pub fn new(backend: B, sounds: Vec<SoundConfig>) -> Self {
        Self {
            backend,
            sounds,
            emitters: HashMap::new(),
        }
    }

    /// Creates a board with [`droid_sound_set`].
    pub fn with_droid_sounds(backend: B) -> Self {
        Self::new(backend, droid_sound_set())
    }

    /// Playback backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable playback backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Emitters held for a droid.
    #[must_use]
    pub fn emitters(&self, agent: AgentId) -> Option<&[SoundEmitter]> {
        self.emitters.get(&agent).map(Vec::as_slice)
    }

    /// Number of droids holding emitters.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.emitters.len()
    }

    /// Routes a cue to the droid's emitters, creating them on first use.
    pub fn dispatch(&mut self, cue: Cue, agent: AgentId, listener: ListenerHandle) {
        let backend = &mut self.backend;
        let sounds = &self.sounds;
        let set = self.emitters.entry(agent).or_insert_with(|| {
            sounds
                .iter()
                .filter_map(|config| {
                    SoundEmitter::new(config.clone(), listener, &mut *backend)
                        .map_err(|e| warn!(agent = %agent, "sound emitter skipped: {e}"))
                        .ok()
                })
                .collect()
        });

        trace!(agent = %agent, %cue, "cue dispatched");
        for emitter in set.iter() {
            emitter.handle_cue(cue, &mut *backend);
        }
    }

    /// Removes every emitter held for a droid.
    pub fn release(&mut self, agent: AgentId) -> Result<(), TeardownError> {
        let Some(set) = self.emitters.remove(&agent) else {
            return Ok(());
        };

        let mut failure = None;
        for emitter in set {
            if let Err(e) = emitter.remove(&mut self.backend) {
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => Err(TeardownError::AudioDisconnect {
                agent,
                message: e.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Silent backend
// ============================================================================

/// Bookkeeping of one source in [`SilentBackend`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilentSource {
    /// Loaded file.
    pub src: Option<String>,
    /// Loop flag.
    pub looping: bool,
    /// Gain.
    pub volume: f32,
    /// Playing right now.
    pub playing: bool,
    /// Times playback was started.
    pub plays: u32,
}

/// Backend that plays nothing and records everything.
#[derive(Debug, Clone, Default)]
pub struct SilentBackend {
    listeners: Vec<Vec3>,
    sources: HashMap<SourceHandle, SilentSource>,
    next_source: u32,
    broken: Vec<String>,
    disconnect_failure: Option<String>,
}

impl SilentBackend {
    /// Makes every load of `src` fail.
    #[must_use]
    pub fn with_broken_file(mut self, src: impl Into<String>) -> Self {
        self.broken.push(src.into());
        self
    }

    /// Makes every disconnect fail with `message`.
    #[must_use]
    pub fn with_disconnect_failure(mut self, message: impl Into<String>) -> Self {
        self.disconnect_failure = Some(message.into());
        self
    }

    /// Number of listeners created.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Position of a listener.
    #[must_use]
    pub fn listener_position(&self, listener: ListenerHandle) -> Option<Vec3> {
        self.listeners.get(listener.0 as usize).copied()
    }

    /// Live source.
    #[must_use]
    pub fn source(&self, source: SourceHandle) -> Option<&SilentSource> {
        self.sources.get(&source)
    }

    /// Number of live sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Total plays of a file across live sources.
    #[must_use]
    pub fn play_count(&self, src: &str) -> u32 {
        self.sources
            .values()
            .filter(|source| source.src.as_deref() == Some(src))
            .map(|source| source.plays)
            .sum()
    }

    /// Number of live sources of a file currently playing.
    #[must_use]
    pub fn playing_count(&self, src: &str) -> usize {
        self.sources
            .values()
            .filter(|source| source.playing && source.src.as_deref() == Some(src))
            .count()
    }
}

impl AudioBackend for SilentBackend {
    fn create_listener(&mut self) -> ListenerHandle {
        self.listeners.push(Vec3::ZERO);
        ListenerHandle((self.listeners.len() - 1) as u32)
    }

    fn set_listener_position(&mut self, listener: ListenerHandle, position: Vec3) {
        if let Some(slot) = self.listeners.get_mut(listener.0 as usize) {
            *slot = position;
        }
    }

    fn create_source(&mut self, _listener: ListenerHandle) -> SourceHandle {
        let handle = SourceHandle(self.next_source);
        self.next_source += 1;
        self.sources.insert(handle, SilentSource::default());
        handle
    }

    fn load(
        &mut self,
        source: SourceHandle,
        src: &str,
        looping: bool,
        volume: f32,
    ) -> Result<(), AudioError> {
        if self.broken.iter().any(|broken| broken == src) {
            return Err(AudioError::LoadFailed {
                src: src.to_string(),
                reason: "unreadable file".to_string(),
            });
        }
        let entry = self.sources.entry(source).or_default();
        entry.src = Some(src.to_string());
        entry.looping = looping;
        entry.volume = volume;
        Ok(())
    }

    fn play(&mut self, source: SourceHandle) {
        if let Some(entry) = self.sources.get_mut(&source) {
            entry.playing = true;
            entry.plays += 1;
        }
    }

    fn stop(&mut self, source: SourceHandle) {
        if let Some(entry) = self.sources.get_mut(&source) {
            entry.playing = false;
        }
    }

    fn pause(&mut self, source: SourceHandle) {
        self.stop(source);
    }

    fn is_loaded(&self, source: SourceHandle) -> bool {
        self.sources
            .get(&source)
            .is_some_and(|entry| entry.src.is_some())
    }

    fn is_playing(&self, source: SourceHandle) -> bool {
        self.sources.get(&source).is_some_and(|entry| entry.playing)
    }

    fn disconnect(&mut self, source: SourceHandle) -> Result<(), AudioError> {
        if let Some(message) = &self.disconnect_failure {
            return Err(AudioError::Disconnect(message.clone()));
        }
        self.sources.remove(&source);
        Ok(())
    }
}
