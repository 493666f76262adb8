use std::fs;
use std::path::{Path, PathBuf};

use dispatch_model::{ApplianceRecord, BusRecord, DataSource, DerProductionRecord, DispatchError, RawInput, UsageRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

pub const BUS_FILE: &str = "bus_params.json";
pub const APPLIANCE_FILE: &str = "appliance_params.json";
pub const DER_PROFILE_FILE: &str = "DER_production.json";
pub const USAGE_FILE: &str = "usage_preference.json";

/// Reads one case from a directory of JSON files
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, DispatchError> {
        let path = self.dir.join(name);
        let text = fs::read_to_string(&path)
            .map_err(|e| DispatchError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| DispatchError::Format(format!("{}: {}", path.display(), e)))
    }

    fn first<T: DeserializeOwned>(&self, name: &str) -> Result<T, DispatchError> {
        self.read::<Vec<T>>(name)?
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::Format(format!("{name}: expected at least one record")))
    }
}

/// The appliance file holds either a list of records or a single one
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl DataSource for JsonDirSource {
    fn load(&self) -> Result<RawInput, DispatchError> {
        debug!(dir = %self.dir.display(), "loading case directory");

        let bus: BusRecord = self.first(BUS_FILE)?;
        let appliance = match self.read::<OneOrMany<ApplianceRecord>>(APPLIANCE_FILE)? {
            OneOrMany::One(record) => record,
            OneOrMany::Many(records) => records
                .into_iter()
                .next()
                .ok_or_else(|| DispatchError::Format(format!("{APPLIANCE_FILE}: expected at least one record")))?,
        };
        let der_profile: DerProductionRecord = self.first(DER_PROFILE_FILE)?;
        let usage: UsageRecord = self.first(USAGE_FILE)?;

        Ok(RawInput {
            bus,
            appliance,
            der_profile,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn case_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn write_case(dir: &Path, appliance: serde_json::Value) {
        write(
            dir,
            BUS_FILE,
            json!([{
                "bus_id": "B1",
                "energy_price_DKK_per_kWh": [1.0, 2.0, 0.5],
                "import_tariff_DKK/kWh": 0.5,
                "export_tariff_DKK/kWh": 0.4,
                "max_import_kW": 4.0,
                "max_export_kW": 4.0,
                "penalty_excess_import_DKK/kWh": 10.0,
                "penalty_excess_export_DKK/kWh": 10.0
            }]),
        );
        write(dir, APPLIANCE_FILE, appliance);
        write(dir, DER_PROFILE_FILE, json!([{ "hourly_profile_ratio": [0.0, 0.5, 1.0] }]));
        write(
            dir,
            USAGE_FILE,
            json!([{ "load_preferences": [{ "min_total_energy_per_day_hour_equivalent": 1.0 }] }]),
        );
    }

    fn appliance() -> serde_json::Value {
        json!({
            "load": [{
                "max_load_kWh_per_hour": 2.0,
                "max_ramp_rate_up_ratio": 1.0,
                "max_ramp_rate_down_ratio": 1.0
            }],
            "DER": [{
                "max_power_kW": 3.0,
                "max_ramp_rate_up_ratio": 1.0,
                "max_ramp_rate_down_ratio": 1.0
            }]
        })
    }

    #[test]
    fn test_load_case_directory() {
        let tmp = case_dir();
        let dir = tmp.path();
        write_case(dir, appliance());

        let input = JsonDirSource::new(dir).load().unwrap();
        assert_eq!(input.bus.energy_price, Some(vec![1.0, 2.0, 0.5]));
        assert_eq!(input.appliance.der[0].max_power, Some(3.0));
        assert_eq!(input.der_profile.hourly_profile_ratio, Some(vec![0.0, 0.5, 1.0]));

        let params = dispatch_model::Parameters::from_input(&input).unwrap();
        assert_eq!(params.horizon, 3);
        assert!((params.e_min - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_appliance_list_uses_first_record() {
        let tmp = case_dir();
        let dir = tmp.path();
        let mut second = appliance();
        second["load"][0]["max_load_kWh_per_hour"] = json!(9.0);
        write_case(dir, json!([appliance(), second]));

        let input = JsonDirSource::new(dir).load().unwrap();
        assert_eq!(input.appliance.load[0].max_load, Some(2.0));
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        let tmp = case_dir();
        let dir = tmp.path();
        write_case(dir, appliance());
        fs::remove_file(dir.join(USAGE_FILE)).unwrap();

        let err = JsonDirSource::new(dir).load().unwrap_err();
        assert!(matches!(err, DispatchError::Io(ref msg) if msg.contains(USAGE_FILE)));

        fs::write(dir.join(USAGE_FILE), "[{").unwrap();
        let err = JsonDirSource::new(dir).load().unwrap_err();
        assert!(matches!(err, DispatchError::Format(_)));

        write(dir, USAGE_FILE, json!([]));
        let err = JsonDirSource::new(dir).load().unwrap_err();
        assert!(matches!(err, DispatchError::Format(ref msg) if msg.contains("at least one")));
    }

    #[test]
    fn test_case_dir_is_removed_after_failed_test() {
        let outcome: std::thread::Result<()> = std::panic::catch_unwind(|| {
            let tmp = case_dir();
            write_case(tmp.path(), appliance());
            let path = tmp.path().to_path_buf();
            assert!(path.join(BUS_FILE).exists());
            std::panic::panic_any(path);
        });
        let path = outcome.unwrap_err().downcast::<PathBuf>().unwrap();

        assert!(!path.exists(), "{} left behind", path.display());
    }
}
