//! Single-stream sound playback for the Sprite Seer engine.
//!
//! Only one sound is audible at a time: starting a sound stops whatever was
//! playing before it.

use std::path::{Path, PathBuf};

use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::tween::Tween;
use kira::Volume;
use thiserror::Error;

/// Playback amplitude of every sound.
pub const SOUND_GAIN: f64 = 0.1;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio device unavailable: {0}")]
    Backend(String),
    #[error("Sound not found: {0}")]
    NotFound(String),
    #[error("Failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Failed to play {name}: {reason}")]
    Play { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Look up `name` in a `(name, path)` list.
pub fn find_sound<'a>(sounds: &'a [(String, PathBuf)], name: &str) -> Result<&'a Path> {
    sounds
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, path)| path.as_path())
        .ok_or_else(|| AudioError::NotFound(name.to_string()))
}

/// Plays one sound at a time on the default output device.
pub struct AudioPlayer {
    manager: AudioManager<DefaultBackend>,
    sounds: Vec<(String, PathBuf)>,
    current: Option<(String, StaticSoundHandle)>,
}

impl AudioPlayer {
    /// Open the output device. The first sound, if any, starts looping
    /// immediately as background music.
    pub fn new(sounds: Vec<(String, PathBuf)>) -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        let mut player = Self {
            manager,
            sounds,
            current: None,
        };

        match player.sounds.first().map(|(name, _)| name.clone()) {
            Some(name) => player.start(&name, true)?,
            None => tracing::warn!("No sounds found; audio stays silent"),
        }
        Ok(player)
    }

    /// Stop the current sound and play `name` once.
    pub fn play_sound(&mut self, name: &str) -> Result<()> {
        self.start(name, false)
    }

    /// Name of the sound started last.
    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn stop(&mut self) {
        if let Some((name, mut handle)) = self.current.take() {
            handle.stop(Tween::default());
            tracing::debug!("Stopped {name}");
        }
    }

    fn start(&mut self, name: &str, looping: bool) -> Result<()> {
        let path = find_sound(&self.sounds, name)?;
        let data = StaticSoundData::from_file(path).map_err(|e| AudioError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let data = data.volume(Volume::Amplitude(SOUND_GAIN));
        let data = if looping { data.loop_region(..) } else { data };

        self.stop();
        let handle = self.manager.play(data).map_err(|e| AudioError::Play {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!("Playing {name}{}", if looping { " (looping)" } else { "" });
        self.current = Some((name.to_string(), handle));
        Ok(())
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sounds() -> Vec<(String, PathBuf)> {
        vec![
            ("audio/jump.wav".into(), PathBuf::from("res/audio/jump.wav")),
            ("audio/theme.ogg".into(), PathBuf::from("res/audio/theme.ogg")),
        ]
    }

    #[test]
    fn finds_sound_by_name() {
        let sounds = sounds();
        assert_eq!(
            find_sound(&sounds, "audio/theme.ogg").unwrap(),
            Path::new("res/audio/theme.ogg")
        );
    }

    #[test]
    fn unknown_sound_is_an_error() {
        let err = find_sound(&sounds(), "audio/missing.wav").unwrap_err();
        assert!(matches!(err, AudioError::NotFound(name) if name == "audio/missing.wav"));
    }
}
