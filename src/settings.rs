// Player settings: volume, field of view and mouse sensitivity, persisted as RON.
use std::collections::BTreeMap;
use std::path::PathBuf;

use bevy::audio::{GlobalVolume, Volume};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::player::Player;

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameSettings::load())
            .add_systems(Update, apply_settings);
    }
}

pub const MASTER_VOLUME_KEY: &str = "MasterVolume";
pub const FOV_KEY: &str = "FOV";
pub const MOUSE_SENSITIVITY_KEY: &str = "MouseSensitivity";

pub const DEFAULT_MASTER_VOLUME: f32 = 1.0;
pub const DEFAULT_FOV: f32 = 60.0;
pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 200.0;

const FOV_RANGE: (f32, f32) = (30.0, 120.0);
const SENSITIVITY_RANGE: (f32, f32) = (150.0, 800.0);

/// Radians of look per pixel of mouse motion at a sensitivity of 1.
const LOOK_RADIANS_PER_UNIT: f32 = 0.000_015;

const SETTINGS_ENV: &str = "HOLLOW_HOUSE_SETTINGS";
const SETTINGS_FILE: &str = "settings.ron";

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(e: ron::error::SpannedError) -> Self {
        SettingsError::Parse(e)
    }
}

impl From<ron::Error> for SettingsError {
    fn from(e: ron::Error) -> Self {
        SettingsError::Serialize(e)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
            SettingsError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Serialize(e) => Some(e),
        }
    }
}

/// Float values under fixed string keys.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsStore {
    values: BTreeMap<String, f32>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn default_path() -> PathBuf {
        std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    /// Open the store at `path`. A missing file is an empty store.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let mut store = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            Self::from_ron(&text)?
        } else {
            Self::default()
        };
        store.path = Some(path);
        Ok(store)
    }

    /// Empty store that still saves to `path`.
    pub fn empty_at(path: PathBuf) -> Self {
        Self {
            values: BTreeMap::new(),
            path: Some(path),
        }
    }

    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::new(),
        )?)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
    }

    /// Write to the backing file, if any.
    pub fn save(&self) -> Result<(), SettingsError> {
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = &self.path {
            std::fs::write(path, self.to_ron()?)?;
        }
        Ok(())
    }
}

#[derive(Resource, Debug)]
pub struct GameSettings {
    master_volume: f32,
    fov: f32,
    mouse_sensitivity: f32,
    store: SettingsStore,
}

impl GameSettings {
    pub fn from_store(store: SettingsStore) -> Self {
        Self {
            master_volume: store
                .get_float(MASTER_VOLUME_KEY, DEFAULT_MASTER_VOLUME)
                .clamp(0.0, 1.0),
            fov: store
                .get_float(FOV_KEY, DEFAULT_FOV)
                .clamp(FOV_RANGE.0, FOV_RANGE.1),
            mouse_sensitivity: store
                .get_float(MOUSE_SENSITIVITY_KEY, DEFAULT_MOUSE_SENSITIVITY)
                .clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1),
            store,
        }
    }

    fn load() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::load_from(SettingsStore::default_path())
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::from_store(SettingsStore::in_memory())
        }
    }

    /// Read settings from `path`. An unreadable file falls back to defaults
    /// and is overwritten by the next change.
    #[cfg(not(target_arch = "wasm32"))]
    fn load_from(path: PathBuf) -> Self {
        match SettingsStore::open(path.clone()) {
            Ok(store) => {
                info!("Loaded settings from {}", path.display());
                Self::from_store(store)
            }
            Err(e) => {
                error!("Could not read settings from {}: {e}", path.display());
                Self::from_store(SettingsStore::empty_at(path))
            }
        }
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn mouse_sensitivity(&self) -> f32 {
        self.mouse_sensitivity
    }

    pub fn set_master_volume(&mut self, value: f32) {
        self.master_volume = value.clamp(0.0, 1.0);
        self.persist(MASTER_VOLUME_KEY, self.master_volume);
    }

    pub fn set_fov(&mut self, value: f32) {
        self.fov = value.clamp(FOV_RANGE.0, FOV_RANGE.1);
        self.persist(FOV_KEY, self.fov);
    }

    pub fn set_mouse_sensitivity(&mut self, value: f32) {
        self.mouse_sensitivity = value.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1);
        self.persist(MOUSE_SENSITIVITY_KEY, self.mouse_sensitivity);
    }

    pub fn reset_to_defaults(&mut self) {
        self.set_master_volume(DEFAULT_MASTER_VOLUME);
        self.set_fov(DEFAULT_FOV);
        self.set_mouse_sensitivity(DEFAULT_MOUSE_SENSITIVITY);
    }

    /// Look radians per pixel of mouse motion.
    pub fn look_scale(&self) -> f32 {
        self.mouse_sensitivity * LOOK_RADIANS_PER_UNIT
    }

    pub fn volume_label(&self) -> String {
        format!("{}%", (self.master_volume * 100.0).round() as i32)
    }

    pub fn fov_label(&self) -> String {
        format!("{}", self.fov.round() as i32)
    }

    /// Sensitivity shown on a 1 to 100 scale.
    pub fn sensitivity_label(&self) -> String {
        let t = (self.mouse_sensitivity - SENSITIVITY_RANGE.0)
            / (SENSITIVITY_RANGE.1 - SENSITIVITY_RANGE.0);
        format!("{}", (1.0 + 99.0 * t).round() as i32)
    }

    fn persist(&mut self, key: &str, value: f32) {
        self.store.set_float(key, value);
        if let Err(e) = self.store.save() {
            warn!("Could not save setting {key}: {e}");
        }
    }
}

fn apply_settings(
    settings: Res<GameSettings>,
    mut global_volume: ResMut<GlobalVolume>,
    mut cameras: Query<&mut Projection, With<Player>>,
) {
    if !settings.is_changed() {
        return;
    }
    global_volume.volume = Volume::Linear(settings.master_volume());
    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.fov = settings.fov().to_radians();
        }
    }
    debug!(
        "Applied settings: volume {}, fov {}, sensitivity {}",
        settings.master_volume(),
        settings.fov(),
        settings.mouse_sensitivity()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_to_their_ranges() {
        let mut settings = GameSettings::from_store(SettingsStore::in_memory());
        settings.set_master_volume(1.7);
        settings.set_fov(10.0);
        settings.set_mouse_sensitivity(9000.0);

        assert_eq!(settings.master_volume(), 1.0);
        assert_eq!(settings.fov(), 30.0);
        assert_eq!(settings.mouse_sensitivity(), 800.0);
    }

    #[test]
    fn stored_values_are_clamped_on_load() {
        let mut store = SettingsStore::in_memory();
        store.set_float(FOV_KEY, 500.0);
        store.set_float(MASTER_VOLUME_KEY, 0.25);
        let settings = GameSettings::from_store(store);

        assert_eq!(settings.fov(), 120.0);
        assert_eq!(settings.master_volume(), 0.25);
        assert_eq!(settings.mouse_sensitivity(), DEFAULT_MOUSE_SENSITIVITY);
    }

    #[test]
    fn labels_match_the_options_menu() {
        let mut settings = GameSettings::from_store(SettingsStore::in_memory());
        settings.set_master_volume(0.456);
        assert_eq!(settings.volume_label(), "46%");
        assert_eq!(settings.fov_label(), "60");

        settings.set_mouse_sensitivity(150.0);
        assert_eq!(settings.sensitivity_label(), "1");
        settings.set_mouse_sensitivity(800.0);
        assert_eq!(settings.sensitivity_label(), "100");
    }

    #[test]
    fn reset_restores_defaults() {
        let mut settings = GameSettings::from_store(SettingsStore::in_memory());
        settings.set_fov(90.0);
        settings.set_master_volume(0.1);
        settings.reset_to_defaults();
        assert_eq!(settings.fov(), DEFAULT_FOV);
        assert_eq!(settings.master_volume(), DEFAULT_MASTER_VOLUME);
    }

    #[test]
    fn store_round_trips_through_a_file() {
        let path = std::env::temp_dir().join(format!(
            "hollow_house_settings_{}.ron",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut settings = GameSettings::from_store(SettingsStore::open(path.clone()).unwrap());
        settings.set_fov(95.0);

        let reopened = GameSettings::from_store(SettingsStore::open(path.clone()).unwrap());
        assert_eq!(reopened.fov(), 95.0);
        assert_eq!(reopened.master_volume(), DEFAULT_MASTER_VOLUME);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let err = SettingsStore::from_ron("not ron at all {").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_file_is_replaced_on_the_next_change() {
        let path = std::env::temp_dir().join(format!(
            "hollow_house_bad_settings_{}.ron",
            std::process::id()
        ));
        std::fs::write(&path, "not ron at all {").unwrap();

        let mut settings = GameSettings::load_from(path.clone());
        assert_eq!(settings.fov(), DEFAULT_FOV);
        settings.set_fov(80.0);

        let reopened = GameSettings::from_store(SettingsStore::open(path.clone()).unwrap());
        assert_eq!(reopened.fov(), 80.0);

        std::fs::remove_file(&path).unwrap();
    }
}
