//! Boundary between untrusted event payloads and typed records.
//!
//! Every field is optional. A field that is missing, `null`, or of the wrong
//! type decodes to `None` and never affects its neighbours.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::config::EventKind;

use super::state::{Write, keys};

/// Lenient accessor over a JSON object; anything else looks empty.
struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    fn is_object(&self) -> bool {
        self.map.is_some()
    }

    /// First of `names` that is present and not null.
    fn first(&self, names: &[&str]) -> Option<&'a Value> {
        let map = self.map?;
        names
            .iter()
            .filter_map(|name| map.get(*name))
            .find(|value| !value.is_null())
    }

    fn object(&self, name: &str) -> Option<Fields<'a>> {
        self.first(&[name])
            .filter(|value| value.is_object())
            .map(Fields::of)
    }

    fn number(&self, names: &[&str]) -> Option<f64> {
        let n = match self.first(names)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    fn integer(&self, names: &[&str]) -> Option<i64> {
        self.number(names).map(|n| n.trunc() as i64)
    }

    fn text(&self, names: &[&str]) -> Option<String> {
        match self.first(names)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn flag(&self, names: &[&str]) -> Option<bool> {
        match self.first(names)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" | "True" | "TRUE" | "1" => Some(true),
                "false" | "False" | "FALSE" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrinterStatus {
    pub bed_temperature: Option<f64>,
    pub nozzle_temperature: Option<f64>,
    pub nozzle_type: Option<String>,
    pub nozzle_diameter: Option<f64>,
    pub status: Option<String>,
    pub gcode_status: Option<String>,
    pub percentage: Option<f64>,
    pub file_name: Option<String>,
    pub current_layer: Option<i64>,
    pub total_layers: Option<i64>,
    /// Unit depends on the backend build, see `TimeUnit`.
    pub remaining_time: Option<f64>,
    pub print_speed: Option<f64>,
    pub timelapse_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempHum {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraImage {
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationReading {
    pub name: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub timestamp: Option<String>,
    pub ac_on: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcSnapshot {
    pub is_on: Option<bool>,
    pub mode: Option<String>,
    pub fan_speed: Option<String>,
    pub thermostat_enabled: Option<bool>,
    pub sleep_enabled: Option<bool>,
    pub sleep_active_now: Option<bool>,
    pub sleep_override_until: Option<String>,
    pub sleep_start: Option<String>,
    pub sleep_stop: Option<String>,
    pub setpoint_c: Option<f64>,
    pub pos_hysteresis: Option<f64>,
    pub neg_hysteresis: Option<f64>,
    pub min_on_s: Option<i64>,
    pub min_off_s: Option<i64>,
    pub poll_interval_s: Option<i64>,
    pub smooth_window: Option<i64>,
    pub max_stale_s: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvgRates {
    pub cooling_c_per_h: Option<f64>,
    pub heating_c_per_h: Option<f64>,
    pub cooling_power_w: Option<f64>,
    pub heating_power_w: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutsideStats {
    pub temperature: Option<(f64, f64)>,
    pub humidity: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarHeaterStatus {
    pub heater_on: Option<bool>,
    pub power_w: Option<f64>,
    pub ambient_c: Option<f64>,
    pub device_c: Option<f64>,
    pub voltage_v: Option<f64>,
    pub current_a: Option<f64>,
    pub energy_last_min_wh: Option<f64>,
    pub energy_total_wh: Option<f64>,
    pub source: Option<String>,
    pub timestamp: Option<String>,
    pub command_status: BTreeMap<String, String>,
    /// A status push means queued commands reached the car.
    pub delivered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub ok: bool,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flash {
    pub category: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Printer(PrinterStatus),
    TempHum(TempHum),
    Image(CameraImage),
    Location(LocationReading),
    Ac(AcSnapshot),
    AvgRates(AvgRates),
    OutsideStats(OutsideStats),
    CarHeater(CarHeaterStatus),
    CarHeaterAction(Option<ActionResult>),
    Flash(Flash),
    ServerShutdown,
}

pub fn decode(kind: EventKind, payload: &Value) -> Update {
    let fields = Fields::of(payload);
    match kind {
        EventKind::PrinterStatus => Update::Printer(decode_printer(&fields)),
        EventKind::TempHum => Update::TempHum(TempHum {
            temperature: fields.number(&["temperature"]),
            humidity: fields.number(&["humidity"]),
        }),
        EventKind::Image => Update::Image(CameraImage {
            image_base64: fields.text(&["image"]).filter(|s| !s.is_empty()),
        }),
        EventKind::LocationReading => Update::Location(decode_location(payload)),
        EventKind::Ac => Update::Ac(decode_ac(&fields)),
        EventKind::AvgRates => Update::AvgRates(AvgRates {
            cooling_c_per_h: fields.number(&["cooling_rate_c_per_h"]),
            heating_c_per_h: fields.number(&["heating_rate_c_per_h"]),
            cooling_power_w: fields.number(&["cooling_power_w"]),
            heating_power_w: fields.number(&["heating_power_w"]),
        }),
        EventKind::OutsideStats => Update::OutsideStats(decode_outside(payload)),
        EventKind::CarHeaterStatus => Update::CarHeater(decode_car_heater(&fields)),
        EventKind::CarHeaterActionResult => {
            Update::CarHeaterAction(fields.is_object().then(|| ActionResult {
                ok: fields.flag(&["ok"]) != Some(false),
                action: fields.text(&["action"]),
            }))
        }
        EventKind::Flash => Update::Flash(Flash {
            category: fields.text(&["category"]),
            message: fields.text(&["message"]),
        }),
        EventKind::Error => Update::Flash(Flash {
            category: Some("error".to_string()),
            message: fields.text(&["message"]),
        }),
        EventKind::ServerShutdown => Update::ServerShutdown,
    }
}

fn decode_printer(fields: &Fields<'_>) -> PrinterStatus {
    PrinterStatus {
        bed_temperature: fields.number(&["bed_temperature"]),
        nozzle_temperature: fields.number(&["nozzle_temperature"]),
        nozzle_type: fields.text(&["nozzle_type"]),
        nozzle_diameter: fields.number(&["nozzle_diameter"]),
        status: fields.text(&["status"]),
        gcode_status: fields.text(&["gcode_status"]),
        percentage: fields.number(&["percentage"]),
        file_name: fields.text(&["file_name"]),
        current_layer: fields.integer(&["current_layer"]),
        total_layers: fields.integer(&["total_layers"]),
        remaining_time: fields.number(&["remaining_time"]),
        print_speed: fields.number(&["print_speed"]),
        timelapse_active: fields.flag(&["timelapse_status"]),
    }
}

/// Readings arrive either as objects (`location`/`name` plus values) or, in
/// server-rendered lists, as a bare location name.
fn decode_location(payload: &Value) -> LocationReading {
    if let Value::String(name) = payload {
        let name = name.trim();
        return LocationReading {
            name: (!name.is_empty()).then(|| name.to_string()),
            ..LocationReading::default()
        };
    }
    let fields = Fields::of(payload);
    LocationReading {
        name: fields
            .text(&["location", "name"])
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        temperature: fields.number(&["temp", "temperature_c", "temperature"]),
        humidity: fields.number(&["hum", "humidity_pct", "humidity"]),
        timestamp: fields.text(&["timestamp", "ts"]),
        ac_on: fields.flag(&["ac_on"]),
    }
}

fn decode_ac(fields: &Fields<'_>) -> AcSnapshot {
    AcSnapshot {
        is_on: fields.flag(&["is_on"]),
        mode: fields.text(&["mode"]).map(|m| m.to_ascii_lowercase()),
        fan_speed: fields
            .text(&["fan_speed", "fan_speed_enum"])
            .map(|f| f.to_ascii_lowercase()),
        thermostat_enabled: fields.flag(&["thermo_active", "enabled", "thermostat_enabled"]),
        sleep_enabled: fields.flag(&["sleep_enabled"]),
        sleep_active_now: fields.flag(&["sleep_time_active"]),
        sleep_override_until: fields.text(&["sleep_override_until"]),
        sleep_start: fields.text(&["sleep_start"]),
        sleep_stop: fields.text(&["sleep_stop"]),
        setpoint_c: fields.number(&["setpoint_c"]),
        pos_hysteresis: fields.number(&["pos_hysteresis"]),
        neg_hysteresis: fields.number(&["neg_hysteresis"]),
        min_on_s: fields.integer(&["min_on_s"]),
        min_off_s: fields.integer(&["min_off_s"]),
        poll_interval_s: fields.integer(&["poll_interval_s"]),
        smooth_window: fields.integer(&["smooth_window"]),
        max_stale_s: fields.integer(&["max_stale_s"]),
    }
}

/// Min/max over today's outside readings.
fn decode_outside(payload: &Value) -> OutsideStats {
    let Some(rows) = payload.as_array() else {
        return OutsideStats::default();
    };

    let mut temperature: Option<(f64, f64)> = None;
    let mut humidity: Option<(f64, f64)> = None;
    for row in rows {
        let fields = Fields::of(row);
        if let Some(t) = fields.number(&["temperature_c", "temperature"]) {
            temperature = Some(widen(temperature, t));
        }
        if let Some(h) = fields.number(&["humidity_pct", "humidity"]) {
            humidity = Some(widen(humidity, h));
        }
    }
    OutsideStats {
        temperature,
        humidity,
    }
}

fn widen(range: Option<(f64, f64)>, value: f64) -> (f64, f64) {
    match range {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    }
}

fn decode_car_heater(fields: &Fields<'_>) -> CarHeaterStatus {
    let status = fields.object("status").unwrap_or(Fields { map: fields.map });

    let mut command_status = BTreeMap::new();
    if let Some(commands) = fields
        .object("command_status")
        .or_else(|| fields.object("commandStatus"))
        .and_then(|c| c.map)
    {
        for (action, state) in commands {
            if let Value::String(state) = state {
                command_status.insert(action.clone(), state.clone());
            }
        }
    }

    CarHeaterStatus {
        heater_on: status.flag(&["is_heater_on"]),
        power_w: status.number(&["instant_power_w"]),
        ambient_c: status.number(&["ambient_temp"]),
        device_c: status.number(&["device_temp_c"]),
        voltage_v: status.number(&["voltage_v"]),
        current_a: status.number(&["current_a"]),
        energy_last_min_wh: status.number(&["energy_last_min_wh"]),
        energy_total_wh: status.number(&["energy_total_wh"]),
        source: status.text(&["source"]),
        timestamp: status.text(&["timestamp"]),
        command_status,
        delivered: fields.is_object(),
    }
}

fn push_number(writes: &mut Vec<Write>, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        writes.push(Write::number(key, value));
    }
}

fn push_integer(writes: &mut Vec<Write>, key: &str, value: Option<i64>) {
    if let Some(value) = value {
        writes.push(Write::number(key, value as f64));
    }
}

fn push_text(writes: &mut Vec<Write>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        writes.push(Write::text(key, value.clone()));
    }
}

fn push_flag(writes: &mut Vec<Write>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        writes.push(Write::flag(key, value));
    }
}

impl Update {
    /// Field writes for every value the payload actually carried.
    pub fn writes(&self) -> Vec<Write> {
        let mut w = Vec::new();
        match self {
            Update::Printer(p) => {
                push_number(&mut w, keys::PRINTER_BED_TEMP, p.bed_temperature);
                push_number(&mut w, keys::PRINTER_NOZZLE_TEMP, p.nozzle_temperature);
                push_text(&mut w, keys::PRINTER_NOZZLE_TYPE, &p.nozzle_type);
                push_number(&mut w, keys::PRINTER_NOZZLE_DIAMETER, p.nozzle_diameter);
                push_text(&mut w, keys::PRINTER_STATUS, &p.status);
                push_text(&mut w, keys::PRINTER_GCODE_STATUS, &p.gcode_status);
                push_number(&mut w, keys::PRINTER_PERCENTAGE, p.percentage);
                push_text(&mut w, keys::PRINTER_FILE_NAME, &p.file_name);
                push_integer(&mut w, keys::PRINTER_CURRENT_LAYER, p.current_layer);
                push_integer(&mut w, keys::PRINTER_TOTAL_LAYERS, p.total_layers);
                push_number(&mut w, keys::PRINTER_REMAINING_TIME, p.remaining_time);
                push_number(&mut w, keys::PRINTER_PRINT_SPEED, p.print_speed);
                push_flag(&mut w, keys::PRINTER_TIMELAPSE, p.timelapse_active);
            }
            Update::TempHum(t) => {
                push_number(&mut w, keys::ROOM_TEMPERATURE, t.temperature);
                push_number(&mut w, keys::ROOM_HUMIDITY, t.humidity);
            }
            Update::Image(img) => push_text(&mut w, keys::CAMERA_IMAGE, &img.image_base64),
            Update::Location(loc) => {
                if let Some(name) = &loc.name {
                    push_number(&mut w, &keys::location(name, "temperature"), loc.temperature);
                    push_number(&mut w, &keys::location(name, "humidity"), loc.humidity);
                    push_text(&mut w, &keys::location(name, "timestamp"), &loc.timestamp);
                    push_flag(&mut w, &keys::location(name, "ac_on"), loc.ac_on);
                }
            }
            Update::Ac(ac) => {
                push_flag(&mut w, keys::AC_IS_ON, ac.is_on);
                push_text(&mut w, keys::AC_MODE, &ac.mode);
                push_text(&mut w, keys::AC_FAN_SPEED, &ac.fan_speed);
                push_flag(&mut w, keys::THERMOSTAT_ENABLED, ac.thermostat_enabled);
                push_flag(&mut w, keys::SLEEP_ENABLED, ac.sleep_enabled);
                push_flag(&mut w, keys::SLEEP_ACTIVE_NOW, ac.sleep_active_now);
                push_text(&mut w, keys::SLEEP_OVERRIDE_UNTIL, &ac.sleep_override_until);
                push_text(&mut w, keys::SLEEP_START, &ac.sleep_start);
                push_text(&mut w, keys::SLEEP_STOP, &ac.sleep_stop);
                push_number(&mut w, keys::THERMO_SETPOINT, ac.setpoint_c);
                push_number(&mut w, keys::THERMO_POS_HYSTERESIS, ac.pos_hysteresis);
                push_number(&mut w, keys::THERMO_NEG_HYSTERESIS, ac.neg_hysteresis);
                push_integer(&mut w, keys::THERMO_MIN_ON_S, ac.min_on_s);
                push_integer(&mut w, keys::THERMO_MIN_OFF_S, ac.min_off_s);
                push_integer(&mut w, keys::THERMO_POLL_INTERVAL_S, ac.poll_interval_s);
                push_integer(&mut w, keys::THERMO_SMOOTH_WINDOW, ac.smooth_window);
                push_integer(&mut w, keys::THERMO_MAX_STALE_S, ac.max_stale_s);
            }
            Update::AvgRates(r) => {
                push_number(&mut w, keys::RATES_COOLING, r.cooling_c_per_h);
                push_number(&mut w, keys::RATES_HEATING, r.heating_c_per_h);
                push_number(&mut w, keys::RATES_COOLING_POWER, r.cooling_power_w);
                push_number(&mut w, keys::RATES_HEATING_POWER, r.heating_power_w);
            }
            Update::OutsideStats(o) => {
                if let Some((lo, hi)) = o.temperature {
                    w.push(Write::number(keys::OUTSIDE_TEMP_MIN, lo));
                    w.push(Write::number(keys::OUTSIDE_TEMP_MAX, hi));
                }
                if let Some((lo, hi)) = o.humidity {
                    w.push(Write::number(keys::OUTSIDE_HUM_MIN, lo));
                    w.push(Write::number(keys::OUTSIDE_HUM_MAX, hi));
                }
            }
            Update::CarHeater(c) => {
                push_flag(&mut w, keys::CAR_HEATER_ON, c.heater_on);
                push_number(&mut w, keys::CAR_POWER_W, c.power_w);
                push_number(&mut w, keys::CAR_AMBIENT_C, c.ambient_c);
                push_number(&mut w, keys::CAR_DEVICE_C, c.device_c);
                push_number(&mut w, keys::CAR_VOLTAGE_V, c.voltage_v);
                push_number(&mut w, keys::CAR_CURRENT_A, c.current_a);
                push_number(&mut w, keys::CAR_ENERGY_LAST_MIN_WH, c.energy_last_min_wh);
                push_number(&mut w, keys::CAR_ENERGY_TOTAL_WH, c.energy_total_wh);
                push_text(&mut w, keys::CAR_SOURCE, &c.source);
                push_text(&mut w, keys::CAR_TIMESTAMP, &c.timestamp);
                for (action, state) in &c.command_status {
                    w.push(Write::text(keys::car_command(action), state.clone()));
                }
                if c.delivered {
                    w.push(Write::text(keys::CAR_QUEUE, "delivered"));
                }
            }
            Update::CarHeaterAction(Some(result)) => {
                w.push(Write::text(
                    keys::CAR_QUEUE,
                    if result.ok { "accepted" } else { "rejected" },
                ));
                if let (true, Some(action)) = (result.ok, &result.action) {
                    w.push(Write::text(keys::car_command(action), "queued"));
                }
            }
            Update::Flash(f) => {
                if let Some(message) = &f.message {
                    let category = f.category.as_deref().unwrap_or("info");
                    w.push(Write::text(keys::FLASH_CATEGORY, category));
                    w.push(Write::text(keys::FLASH_MESSAGE, message.clone()));
                }
            }
            Update::CarHeaterAction(None) | Update::ServerShutdown => {}
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn printer_status_keeps_only_present_fields() {
        let update = decode(
            EventKind::PrinterStatus,
            &json!({"bed_temperature": 57.34, "percentage": 42, "file_name": null}),
        );
        let Update::Printer(p) = &update else {
            panic!("expected printer status");
        };
        assert_eq!(p.bed_temperature, Some(57.34));
        assert_eq!(p.percentage, Some(42.0));
        assert_eq!(p.file_name, None);
        assert_eq!(update.writes().len(), 2);
    }

    #[test]
    fn malformed_fields_are_ignored_individually() {
        let update = decode(
            EventKind::PrinterStatus,
            &json!({
                "bed_temperature": "hot",
                "nozzle_temperature": 210.04,
                "current_layer": [1],
                "timelapse_status": "maybe",
                "status": {"nested": true}
            }),
        );
        let Update::Printer(p) = update else {
            panic!("expected printer status");
        };
        assert_eq!(p.bed_temperature, None);
        assert_eq!(p.nozzle_temperature, Some(210.04));
        assert_eq!(p.current_layer, None);
        assert_eq!(p.timelapse_active, None);
        assert_eq!(p.status, None);
    }

    #[test]
    fn timelapse_accepts_python_style_strings() {
        let Update::Printer(p) = decode(EventKind::PrinterStatus, &json!({"timelapse_status": "True"}))
        else {
            panic!("expected printer status");
        };
        assert_eq!(p.timelapse_active, Some(true));
    }

    #[test]
    fn non_object_payload_decodes_to_nothing() {
        for payload in [json!(null), json!([1, 2]), json!(12)] {
            assert!(decode(EventKind::Ac, &payload).writes().is_empty());
            assert!(decode(EventKind::PrinterStatus, &payload).writes().is_empty());
        }
        assert_eq!(
            decode(EventKind::CarHeaterActionResult, &json!(null)),
            Update::CarHeaterAction(None)
        );
    }

    #[test]
    fn location_aliases() {
        let Update::Location(loc) = decode(
            EventKind::LocationReading,
            &json!({"location": " Olohuone ", "temperature_c": 21.4, "humidity_pct": "40", "ac_on": false}),
        ) else {
            panic!("expected location");
        };
        assert_eq!(loc.name.as_deref(), Some("Olohuone"));
        assert_eq!(loc.temperature, Some(21.4));
        assert_eq!(loc.humidity, Some(40.0));
        assert_eq!(loc.ac_on, Some(false));

        let nameless = decode(EventKind::LocationReading, &json!({"temperature": 20.0}));
        assert!(nameless.writes().is_empty());
    }

    #[test]
    fn thermostat_prefers_thermo_active() {
        let Update::Ac(ac) = decode(
            EventKind::Ac,
            &json!({"enabled": false, "thermo_active": true}),
        ) else {
            panic!("expected ac");
        };
        assert_eq!(ac.thermostat_enabled, Some(true));

        let Update::Ac(ac) = decode(EventKind::Ac, &json!({"thermostat_enabled": false})) else {
            panic!("expected ac");
        };
        assert_eq!(ac.thermostat_enabled, Some(false));
    }

    #[test]
    fn outside_rows_reduce_to_ranges() {
        let Update::OutsideStats(stats) = decode(
            EventKind::OutsideStats,
            &json!([
                {"temperature_c": 2.0, "humidity_pct": 80},
                {"temperature": -1.5, "humidity": 91.2},
                {"temperature_c": "bad"}
            ]),
        ) else {
            panic!("expected outside stats");
        };
        assert_eq!(stats.temperature, Some((-1.5, 2.0)));
        assert_eq!(stats.humidity, Some((80.0, 91.2)));
    }

    #[test]
    fn car_heater_nested_and_command_status() {
        let update = decode(
            EventKind::CarHeaterStatus,
            &json!({
                "status": {"is_heater_on": true, "instant_power_w": 35.1},
                "commandStatus": {"turn_on": "sent", "get_logs": null}
            }),
        );
        let Update::CarHeater(car) = &update else {
            panic!("expected car heater");
        };
        assert_eq!(car.heater_on, Some(true));
        assert_eq!(car.power_w, Some(35.1));
        assert_eq!(car.command_status.len(), 1);
        assert!(
            update
                .writes()
                .contains(&Write::text(keys::car_command("turn_on"), "sent"))
        );
        assert!(update.writes().contains(&Write::text(keys::CAR_QUEUE, "delivered")));
    }

    #[test]
    fn action_result_defaults_to_ok() {
        let update = decode(EventKind::CarHeaterActionResult, &json!({"action": "turn_off"}));
        assert_eq!(
            update.writes(),
            vec![
                Write::text(keys::CAR_QUEUE, "accepted"),
                Write::text(keys::car_command("turn_off"), "queued"),
            ]
        );
        let failed = decode(EventKind::CarHeaterActionResult, &json!({"ok": false, "action": "turn_off"}));
        assert_eq!(failed.writes(), vec![Write::text(keys::CAR_QUEUE, "rejected")]);
    }

    #[test]
    fn server_error_becomes_error_flash() {
        let update = decode(EventKind::Error, &json!({"message": "Unsupported mode: hot"}));
        assert_eq!(
            update.writes(),
            vec![
                Write::text(keys::FLASH_CATEGORY, "error"),
                Write::text(keys::FLASH_MESSAGE, "Unsupported mode: hot"),
            ]
        );
    }
}
