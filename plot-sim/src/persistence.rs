//! Save and restore the simulator settings as JSON. The palette is not
//! stored and comes back as the default.

use std::path::Path;

use sweep_plot::Settings;

pub const SETTINGS_FILE: &str = "sweep-plot-sim.json";

pub fn settings_to_json(settings: &Settings) -> Result<String, String> {
    serde_json::to_string_pretty(settings).map_err(|e| e.to_string())
}

pub fn settings_from_json(json: &str) -> Result<Settings, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), String> {
    let txt = settings_to_json(settings)?;
    std::fs::write(path, txt).map_err(|e| e.to_string())
}

pub fn load_settings(path: &Path) -> Result<Settings, String> {
    let txt = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    settings_from_json(&txt)
}
