use lms_stitch::StitchParams;
use lms_util::{log, AnyError, Path, PathBuf};
use lms_vision::consts::TEMPLATE_PREFIXES;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Root of the tiles, canvases, checkpoints and final maps
	pub work_dir: PathBuf,
	pub templates_dir: PathBuf,
	pub template_prefixes: Vec<String>,

	#[serde(flatten)]
	pub stitch: StitchParams,
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			work_dir: PathBuf::from("work"),
			templates_dir: PathBuf::from("templates"),
			template_prefixes: TEMPLATE_PREFIXES.iter().map(|prefix| prefix.to_string()).collect(),
			stitch: StitchParams::default(),
		}
	}
}
impl Settings {
	/// Reads the settings file, falling back to defaults if it's missing or broken
	pub fn load(path: &Path) -> Self {
		let file = match std::fs::File::open(path) {
			Ok(file) => file,
			Err(_) => {
				log::info!("no settings at {}, using defaults", path.display());
				return Self::default();
			}
		};

		match serde_json::from_reader(std::io::BufReader::new(file)) {
			Ok(settings) => settings,
			Err(err) => {
				log::warn!("ignoring unreadable settings at {}: {err}", path.display());
				Self::default()
			}
		}
	}

	pub fn save(&self, path: &Path) -> Result<(), AnyError> {
		std::fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_settings_keep_defaults() {
		let settings: Settings = serde_json::from_str(r#"{ "work_dir": "maps", "registrar": { "threshold": 0.95 }, "locator": { "workers": 3 } }"#).unwrap();

		assert_eq!(settings.work_dir, PathBuf::from("maps"));
		assert_eq!(settings.template_prefixes, ["mm_tp", "mm_sp", "mm_boss", "mm_sub"]);
		assert_eq!(settings.stitch.registrar.threshold, 0.95);
		assert_eq!(settings.stitch.registrar.depth, lms_vision::register::RegistrarParams::default().depth);
		assert_eq!(settings.stitch.locator.workers, 3);
		assert_eq!(settings.stitch.locator.threshold, 0.7);
		assert_eq!(settings.stitch.expander.sensor_radius, 95);
	}

	#[test]
	fn test_missing_or_broken_file() {
		let scratch = lms_util::ScratchDir::new("settings").unwrap();
		let path = scratch.path().join("settings.json");
		assert_eq!(Settings::load(&path).work_dir, PathBuf::from("work"));

		std::fs::write(&path, "{ not json").unwrap();
		assert_eq!(Settings::load(&path).work_dir, PathBuf::from("work"));

		let mut settings = Settings::default();
		settings.work_dir = PathBuf::from("elsewhere");
		settings.save(&path).unwrap();
		assert_eq!(Settings::load(&path).work_dir, PathBuf::from("elsewhere"));
	}
}
