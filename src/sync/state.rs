use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Logical field names. Fields are independent; nothing ties one to another.
pub mod keys {
    pub const PRINTER_BED_TEMP: &str = "printer.bed_temperature";
    pub const PRINTER_NOZZLE_TEMP: &str = "printer.nozzle_temperature";
    pub const PRINTER_NOZZLE_TYPE: &str = "printer.nozzle_type";
    pub const PRINTER_NOZZLE_DIAMETER: &str = "printer.nozzle_diameter";
    pub const PRINTER_STATUS: &str = "printer.status";
    pub const PRINTER_GCODE_STATUS: &str = "printer.gcode_status";
    pub const PRINTER_PERCENTAGE: &str = "printer.percentage";
    pub const PRINTER_FILE_NAME: &str = "printer.file_name";
    pub const PRINTER_CURRENT_LAYER: &str = "printer.current_layer";
    pub const PRINTER_TOTAL_LAYERS: &str = "printer.total_layers";
    pub const PRINTER_REMAINING_TIME: &str = "printer.remaining_time";
    pub const PRINTER_PRINT_SPEED: &str = "printer.print_speed";
    pub const PRINTER_TIMELAPSE: &str = "printer.timelapse_active";

    pub const ROOM_TEMPERATURE: &str = "room.temperature";
    pub const ROOM_HUMIDITY: &str = "room.humidity";
    pub const CAMERA_IMAGE: &str = "camera.image";

    pub const AC_IS_ON: &str = "ac.is_on";
    pub const AC_MODE: &str = "ac.mode";
    pub const AC_FAN_SPEED: &str = "ac.fan_speed";
    pub const THERMOSTAT_ENABLED: &str = "thermostat.enabled";
    pub const SLEEP_ENABLED: &str = "sleep.enabled";
    pub const SLEEP_ACTIVE_NOW: &str = "sleep.active_now";
    pub const SLEEP_OVERRIDE_UNTIL: &str = "sleep.override_until";
    pub const SLEEP_START: &str = "sleep.start";
    pub const SLEEP_STOP: &str = "sleep.stop";
    pub const THERMO_SETPOINT: &str = "thermo.setpoint_c";
    pub const THERMO_POS_HYSTERESIS: &str = "thermo.pos_hysteresis";
    pub const THERMO_NEG_HYSTERESIS: &str = "thermo.neg_hysteresis";
    pub const THERMO_MIN_ON_S: &str = "thermo.min_on_s";
    pub const THERMO_MIN_OFF_S: &str = "thermo.min_off_s";
    pub const THERMO_POLL_INTERVAL_S: &str = "thermo.poll_interval_s";
    pub const THERMO_SMOOTH_WINDOW: &str = "thermo.smooth_window";
    pub const THERMO_MAX_STALE_S: &str = "thermo.max_stale_s";

    pub const RATES_COOLING: &str = "rates.cooling_c_per_h";
    pub const RATES_HEATING: &str = "rates.heating_c_per_h";
    pub const RATES_COOLING_POWER: &str = "rates.cooling_power_w";
    pub const RATES_HEATING_POWER: &str = "rates.heating_power_w";

    pub const OUTSIDE_TEMP_MIN: &str = "outside.temp_min";
    pub const OUTSIDE_TEMP_MAX: &str = "outside.temp_max";
    pub const OUTSIDE_HUM_MIN: &str = "outside.hum_min";
    pub const OUTSIDE_HUM_MAX: &str = "outside.hum_max";

    pub const CAR_HEATER_ON: &str = "car.heater_on";
    pub const CAR_POWER_W: &str = "car.power_w";
    pub const CAR_AMBIENT_C: &str = "car.ambient_c";
    pub const CAR_DEVICE_C: &str = "car.device_c";
    pub const CAR_VOLTAGE_V: &str = "car.voltage_v";
    pub const CAR_CURRENT_A: &str = "car.current_a";
    pub const CAR_ENERGY_LAST_MIN_WH: &str = "car.energy_last_min_wh";
    pub const CAR_ENERGY_TOTAL_WH: &str = "car.energy_total_wh";
    pub const CAR_SOURCE: &str = "car.source";
    pub const CAR_TIMESTAMP: &str = "car.timestamp";
    pub const CAR_QUEUE: &str = "car.queue";
    pub const CAR_COMMAND_PREFIX: &str = "car.command.";

    pub const FLASH_MESSAGE: &str = "flash.message";
    pub const FLASH_CATEGORY: &str = "flash.category";

    pub const LOCATION_PREFIX: &str = "location/";

    pub fn car_command(action: &str) -> String {
        format!("{CAR_COMMAND_PREFIX}{action}")
    }

    pub fn location(name: &str, field: &str) -> String {
        format!("{LOCATION_PREFIX}{name}/{field}")
    }

    /// Split `location/<name>/<field>` back into its parts.
    pub fn split_location(key: &str) -> Option<(&str, &str)> {
        key.strip_prefix(LOCATION_PREFIX)?.rsplit_once('/')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Authoritative,
    Optimistic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub value: FieldValue,
    pub received_at: DateTime<Utc>,
    pub origin: Origin,
}

/// A single field assignment produced by decoding or by an optimistic update.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub key: String,
    pub value: FieldValue,
}

impl Write {
    pub fn flag(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Flag(value),
        }
    }

    pub fn number(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Number(value),
        }
    }

    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Text(value.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewState {
    fields: BTreeMap<String, FieldEntry>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the writes, leaving every other field untouched. Returns the keys
    /// written, in write order.
    pub fn merge(&mut self, writes: Vec<Write>, origin: Origin, now: DateTime<Utc>) -> Vec<String> {
        let mut written = Vec::with_capacity(writes.len());
        for write in writes {
            written.push(write.key.clone());
            self.fields.insert(
                write.key,
                FieldEntry {
                    value: write.value,
                    received_at: now,
                    origin,
                },
            );
        }
        written
    }

    pub fn get(&self, key: &str) -> Option<&FieldEntry> {
        self.fields.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).map(|entry| &entry.value)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.value(key)? {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.value(key)? {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.value(key)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_optimistic(&self, key: &str) -> bool {
        self.fields
            .get(key)
            .is_some_and(|entry| entry.origin == Origin::Optimistic)
    }

    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a FieldEntry)> + 'a {
        self.fields
            .range(prefix.to_string()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_leaves_absent_fields_untouched() {
        let mut state = ViewState::new();
        let now = Utc::now();
        state.merge(
            vec![
                Write::number(keys::PRINTER_BED_TEMP, 57.3),
                Write::text(keys::PRINTER_STATUS, "printing"),
            ],
            Origin::Authoritative,
            now,
        );
        let written = state.merge(
            vec![Write::number(keys::PRINTER_NOZZLE_TEMP, 210.0)],
            Origin::Authoritative,
            now,
        );

        assert_eq!(written, vec![keys::PRINTER_NOZZLE_TEMP.to_string()]);
        assert_eq!(state.number(keys::PRINTER_BED_TEMP), Some(57.3));
        assert_eq!(state.text(keys::PRINTER_STATUS), Some("printing"));
        assert_eq!(state.with_prefix("").count(), 3);
    }

    #[test]
    fn authoritative_write_replaces_optimistic() {
        let mut state = ViewState::new();
        let now = Utc::now();
        state.merge(vec![Write::text(keys::AC_MODE, "cold")], Origin::Optimistic, now);
        assert!(state.is_optimistic(keys::AC_MODE));

        state.merge(vec![Write::text(keys::AC_MODE, "wet")], Origin::Authoritative, now);
        assert!(!state.is_optimistic(keys::AC_MODE));
        assert_eq!(state.text(keys::AC_MODE), Some("wet"));
    }

    #[test]
    fn typed_accessors_reject_other_variants() {
        let mut state = ViewState::new();
        state.merge(vec![Write::flag(keys::AC_IS_ON, true)], Origin::Authoritative, Utc::now());
        assert_eq!(state.flag(keys::AC_IS_ON), Some(true));
        assert_eq!(state.number(keys::AC_IS_ON), None);
        assert_eq!(state.text(keys::AC_IS_ON), None);
    }

    #[test]
    fn prefix_scan_and_location_keys() {
        let mut state = ViewState::new();
        let now = Utc::now();
        state.merge(
            vec![
                Write::number(keys::location("Olohuone", "temperature"), 21.0),
                Write::number(keys::location("Parveke", "temperature"), 4.5),
                Write::flag(keys::AC_IS_ON, false),
            ],
            Origin::Authoritative,
            now,
        );
        let names: Vec<_> = state
            .with_prefix(keys::LOCATION_PREFIX)
            .filter_map(|(key, _)| keys::split_location(key))
            .collect();
        assert_eq!(
            names,
            vec![("Olohuone", "temperature"), ("Parveke", "temperature")]
        );
    }
}
