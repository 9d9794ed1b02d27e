use firecore::rig_interface::RigSettings;

#[derive(Debug, Clone, Copy)]
pub enum SettingsField {
    EspIp,
    SmokeThreshold,
    TempThreshold,
}

/// Editable copy of the rig settings, kept as raw strings until saved.
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pub open: bool,
    pub esp_ip: String,
    pub smoke_threshold: String,
    pub temp_threshold: String,
    pub error: Option<String>,
    loaded: Option<RigSettings>,
}

impl SettingsForm {
    pub fn update_field(&mut self, field: SettingsField, value: String) {
        match field {
            SettingsField::EspIp => self.esp_ip = value,
            SettingsField::SmokeThreshold => self.smoke_threshold = value,
            SettingsField::TempThreshold => self.temp_threshold = value,
        }
        self.error = None;
    }

    /// Copies freshly loaded settings into the fields; repeats of the same values are ignored.
    pub fn prefill(&mut self, settings: &RigSettings) {
        if self.loaded.as_ref() == Some(settings) {
            return;
        }
        self.esp_ip = settings.esp_ip.clone();
        self.smoke_threshold = settings.smoke_threshold.to_string();
        self.temp_threshold = settings.temp_threshold.to_string();
        self.loaded = Some(settings.clone());
    }

    pub fn to_settings(&self) -> Result<RigSettings, String> {
        let esp_ip = self.esp_ip.trim();
        if esp_ip.is_empty() {
            return Err("ESP32 address is required".into());
        }
        Ok(RigSettings {
            esp_ip: esp_ip.to_string(),
            smoke_threshold: parse_threshold("Smoke threshold", &self.smoke_threshold)?,
            temp_threshold: parse_threshold("Temperature threshold", &self.temp_threshold)?,
        })
    }
}

fn parse_threshold(label: &str, raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(format!("{label} must be a non-negative number, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> RigSettings {
        RigSettings {
            esp_ip: "192.168.2.131".into(),
            smoke_threshold: 2600.0,
            temp_threshold: 60.0,
        }
    }

    #[test]
    fn prefill_then_edit_then_save() {
        let mut form = SettingsForm::default();
        form.prefill(&loaded());
        assert_eq!(form.smoke_threshold, "2600");

        form.update_field(SettingsField::TempThreshold, "45.5".into());
        let settings = form.to_settings().unwrap();
        assert_eq!(settings.temp_threshold, 45.5);
        assert_eq!(settings.esp_ip, "192.168.2.131");
    }

    #[test]
    fn same_settings_do_not_clobber_edits() {
        let mut form = SettingsForm::default();
        form.prefill(&loaded());
        form.update_field(SettingsField::EspIp, "10.0.0.7".into());
        form.prefill(&loaded());
        assert_eq!(form.esp_ip, "10.0.0.7");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let mut form = SettingsForm::default();
        form.prefill(&loaded());
        form.update_field(SettingsField::SmokeThreshold, "lots".into());
        let err = form.to_settings().unwrap_err();
        assert!(err.starts_with("Smoke threshold"));

        form.update_field(SettingsField::SmokeThreshold, "-3".into());
        assert!(form.to_settings().is_err());

        form.update_field(SettingsField::SmokeThreshold, "2000".into());
        form.update_field(SettingsField::EspIp, "  ".into());
        assert_eq!(form.to_settings().unwrap_err(), "ESP32 address is required");
    }
}
