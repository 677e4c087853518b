//! Saved engine state as a JSON document.
//!
//! The document carries a tag, the global render settings and one record
//! per source. Reading is lenient: any field that is missing or has the
//! wrong type takes its default. Only a missing or foreign tag rejects the
//! document.

use crate::error::{Error, Result};
use crate::shared::EngineShared;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spatia_core::config::{clamp_speed_of_sound, DEFAULT_SPEED_OF_SOUND};
use spatia_core::{LoopSettings, ProcessingMode};
use spatia_scene::{sources_from_values, sources_to_records, SourceRecord, Sources};

/// Tag identifying a saved Spatia state.
pub const STATE_TAG: &str = "SpatiaSettings";

/// Global settings stored alongside the sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub doppler_on: bool,
    pub speed_of_sound: f32,
    pub loop_region_begin: f64,
    pub loop_region_end: f64,
    pub looping_enabled: bool,
    pub processing_mode: ProcessingMode,
    pub wet_output_volume: f32,
    pub dry_output_volume: f32,
    pub lock_sources_to_paths: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        let looping = LoopSettings::default();
        Self {
            doppler_on: false,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            loop_region_begin: looping.begin,
            loop_region_end: looping.end,
            looping_enabled: looping.enabled,
            processing_mode: ProcessingMode::default(),
            wet_output_volume: 1.0,
            dry_output_volume: 0.0,
            lock_sources_to_paths: true,
        }
    }
}

impl GlobalSettings {
    fn from_value(document: &Value) -> Self {
        let defaults = Self::default();
        Self {
            doppler_on: field(document, "doppler_on").unwrap_or(defaults.doppler_on),
            speed_of_sound: field(document, "speed_of_sound")
                .map(clamp_speed_of_sound)
                .unwrap_or(defaults.speed_of_sound),
            loop_region_begin: field(document, "loop_region_begin")
                .unwrap_or(defaults.loop_region_begin),
            loop_region_end: field(document, "loop_region_end").unwrap_or(defaults.loop_region_end),
            looping_enabled: field(document, "looping_enabled").unwrap_or(defaults.looping_enabled),
            processing_mode: field(document, "processing_mode").unwrap_or(defaults.processing_mode),
            wet_output_volume: field(document, "wet_output_volume")
                .unwrap_or(defaults.wet_output_volume),
            dry_output_volume: field(document, "dry_output_volume")
                .unwrap_or(defaults.dry_output_volume),
            lock_sources_to_paths: field(document, "lock_sources_to_paths")
                .unwrap_or(defaults.lock_sources_to_paths),
        }
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            begin: self.loop_region_begin,
            end: self.loop_region_end,
            enabled: self.looping_enabled,
        }
    }
}

fn field<T: DeserializeOwned>(document: &Value, key: &str) -> Option<T> {
    document.get(key).and_then(|v| T::deserialize(v).ok())
}

#[derive(Serialize)]
struct Document<'a> {
    tag: &'a str,
    #[serde(flatten)]
    settings: &'a GlobalSettings,
    sources: Vec<SourceRecord>,
}

/// Everything that is saved with a session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavedState {
    pub settings: GlobalSettings,
    pub sources: Sources,
}

impl SavedState {
    pub(crate) fn capture(shared: &EngineShared) -> Self {
        let render = &shared.settings;
        let looping = shared.loop_control.load();
        let settings = GlobalSettings {
            doppler_on: render.doppler_enabled(),
            speed_of_sound: render.speed_of_sound(),
            loop_region_begin: looping.begin,
            loop_region_end: looping.end,
            looping_enabled: looping.enabled,
            processing_mode: render.processing_mode(),
            wet_output_volume: render.wet_volume(),
            dry_output_volume: render.dry_volume(),
            lock_sources_to_paths: render.locked_to_paths(),
        };
        let sources = shared.sources.pin().clone();
        Self { settings, sources }
    }

    /// Publishes the state to the running engine.
    pub(crate) fn apply(self, shared: &EngineShared) {
        let render = &shared.settings;
        render.set_doppler_enabled(self.settings.doppler_on);
        render.set_speed_of_sound(self.settings.speed_of_sound);
        render.set_processing_mode(self.settings.processing_mode);
        render.set_wet_dry(self.settings.wet_output_volume, self.settings.dry_output_volume);
        render.set_locked_to_paths(self.settings.lock_sources_to_paths);
        shared.loop_control.store(self.settings.loop_settings());
        shared
            .sources
            .store(self.sources.capped(shared.config.max_sources));
    }

    pub fn to_json(&self) -> Result<String> {
        let document = Document {
            tag: STATE_TAG,
            settings: &self.settings,
            sources: sources_to_records(&self.sources),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses a saved document. Fails only if the text is not JSON or is
    /// not tagged as a Spatia state.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        let tag = document.get("tag").and_then(Value::as_str);
        if tag != Some(STATE_TAG) {
            return Err(Error::UnrecognizedState {
                found: tag.map(str::to_owned),
            });
        }
        let sources = match document.get("sources").and_then(Value::as_array) {
            Some(values) => sources_from_values(values),
            None => Sources::default(),
        };
        Ok(Self {
            settings: GlobalSettings::from_value(&document),
            sources,
        })
    }
}
