use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::error::CommandError;
use crate::sync::state::{FieldValue, Write, keys};

pub const AC_CONTROL: &str = "ac_control";
pub const PRINTER_ACTION: &str = "printerAction";
pub const CAR_HEATER_CONTROL: &str = "car_heater_control";

const AC_MODES: [&str; 3] = ["cold", "wet", "wind"];
const FAN_SPEEDS: [&str; 2] = ["low", "high"];
const PRINTER_ACTIONS: [&str; 7] = [
    "pause",
    "resume",
    "stop",
    "home",
    "timelapse_start",
    "timelapse_stop",
    "run_gcode",
];
pub const CAR_HEATER_ACTIONS: [&str; 5] =
    ["turn_on", "turn_off", "get_logs", "esp_restart", "shelly_restart"];

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Param>),
}

impl Param {
    fn to_json(&self) -> Value {
        match self {
            Param::Null => Value::Null,
            Param::Bool(b) => json!(b),
            Param::Int(n) => json!(n),
            Param::Float(f) => json!(f),
            Param::Str(s) => json!(s),
            Param::List(items) => Value::Array(items.iter().map(Param::to_json).collect()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Param::Int(n) => Some(*n as f64),
            Param::Float(f) => Some(*f),
            Param::Str(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Param::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// A user-triggered action, emitted once under `event` as `{action, ...params}`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCommand {
    pub event: String,
    pub action: String,
    pub params: BTreeMap<String, Param>,
}

impl OutboundCommand {
    pub fn new(event: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Param) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("action".to_string(), json!(self.action));
        for (key, value) in &self.params {
            if key != "action" {
                body.insert(key.clone(), value.to_json());
            }
        }
        Value::Object(body)
    }

    fn param(&self, key: &str) -> Option<&Param> {
        self.params.get(key)
    }

    /// Reject commands the backend is known to refuse, before anything is sent.
    pub fn validate(&self) -> Result<(), CommandError> {
        match self.event.as_str() {
            AC_CONTROL => self.validate_ac(),
            PRINTER_ACTION => {
                if !PRINTER_ACTIONS.contains(&self.action.as_str()) {
                    return Err(CommandError::Unsupported {
                        field: "printer action",
                        value: self.action.clone(),
                    });
                }
                if self.action == "run_gcode" {
                    let gcode = self.param("gcode").and_then(Param::as_str).map(str::trim);
                    if gcode.is_none_or(str::is_empty) {
                        return Err(CommandError::MissingParam("gcode"));
                    }
                }
                Ok(())
            }
            CAR_HEATER_CONTROL => {
                if CAR_HEATER_ACTIONS.contains(&self.action.as_str()) {
                    Ok(())
                } else {
                    Err(CommandError::Unsupported {
                        field: "car heater action",
                        value: self.action.clone(),
                    })
                }
            }
            _ => Ok(()),
        }
    }

    fn validate_ac(&self) -> Result<(), CommandError> {
        match self.action.as_str() {
            "set_mode" => self.require_choice("value", "mode", &AC_MODES),
            "set_fan_speed" => self.require_choice("value", "fan speed", &FAN_SPEEDS),
            "set_setpoint" | "set_hysteresis" => self.require_number("value"),
            "disable_sleep_for" => self.require_number("minutes"),
            "set_hysteresis_split" => {
                self.require_number("pos")?;
                self.require_number("neg")
            }
            "set_sleep_enabled" => match self.param("value") {
                Some(Param::Bool(_)) => Ok(()),
                Some(other) => Err(CommandError::Unsupported {
                    field: "sleep flag",
                    value: format!("{other:?}"),
                }),
                None => Err(CommandError::MissingParam("value")),
            },
            _ => Ok(()),
        }
    }

    fn require_choice(
        &self,
        key: &'static str,
        field: &'static str,
        allowed: &[&str],
    ) -> Result<(), CommandError> {
        let value = self
            .param(key)
            .and_then(Param::as_str)
            .ok_or(CommandError::MissingParam(key))?;
        let normalized = value.trim().to_ascii_lowercase();
        if allowed.contains(&normalized.as_str()) {
            Ok(())
        } else {
            Err(CommandError::Unsupported {
                field,
                value: value.to_string(),
            })
        }
    }

    /// Bring parameter values into the shape the backend expects.
    pub fn normalized(mut self) -> Self {
        if self.event == AC_CONTROL && self.action == "disable_sleep_for" {
            if let Some(minutes) = self.param("minutes").and_then(Param::as_f64) {
                self.params
                    .insert("minutes".to_string(), Param::Int(sleep_override_minutes(minutes)));
            }
        }
        self
    }

    fn require_number(&self, key: &'static str) -> Result<(), CommandError> {
        match self.param(key) {
            None => Err(CommandError::MissingParam(key)),
            Some(p) if p.as_f64().is_some() => Ok(()),
            Some(_) => Err(CommandError::NotNumeric(key)),
        }
    }

    /// Field writes shown locally before the server confirms the action.
    pub fn optimistic_writes(&self) -> Vec<Write> {
        let mut writes = Vec::new();
        match (self.event.as_str(), self.action.as_str()) {
            (AC_CONTROL, "power_on") => writes.push(Write::flag(keys::AC_IS_ON, true)),
            (AC_CONTROL, "power_off") => writes.push(Write::flag(keys::AC_IS_ON, false)),
            (AC_CONTROL, "thermostat_enable") => {
                writes.push(Write::flag(keys::THERMOSTAT_ENABLED, true))
            }
            (AC_CONTROL, "thermostat_disable") => {
                writes.push(Write::flag(keys::THERMOSTAT_ENABLED, false))
            }
            (AC_CONTROL, "set_mode") => {
                if let Some(mode) = self.param("value").and_then(Param::as_str) {
                    writes.push(Write::text(keys::AC_MODE, mode.trim().to_ascii_lowercase()));
                }
            }
            (AC_CONTROL, "set_fan_speed") => {
                if let Some(fan) = self.param("value").and_then(Param::as_str) {
                    writes.push(Write::text(keys::AC_FAN_SPEED, fan.trim().to_ascii_lowercase()));
                }
            }
            (AC_CONTROL, "set_sleep_enabled") => {
                if let Some(enabled) = self.param("value").and_then(Param::as_bool) {
                    writes.push(Write::flag(keys::SLEEP_ENABLED, enabled));
                }
            }
            (AC_CONTROL, "set_setpoint") => {
                if let Some(setpoint) = self.param("value").and_then(Param::as_f64) {
                    writes.push(Write {
                        key: keys::THERMO_SETPOINT.to_string(),
                        value: FieldValue::Number(setpoint),
                    });
                }
            }
            (CAR_HEATER_CONTROL, action) => {
                writes.push(Write::text(keys::car_command(action), "queued"));
                writes.push(Write::text(keys::CAR_QUEUE, "pending"));
            }
            _ => {}
        }
        writes
    }
}

/// Parse `<event> <action> [key=value ...]`.
pub fn parse_line(line: &str) -> Result<OutboundCommand, CommandError> {
    let tokens = tokenize(line)?;
    let mut tokens = tokens.into_iter();
    let (event, _) = tokens.next().ok_or(CommandError::Empty)?;
    let (action, _) = tokens.next().ok_or(CommandError::MissingAction)?;

    let mut command = OutboundCommand::new(event, action);
    for (token, quoted) in tokens {
        let Some((key, raw)) = token.split_once('=') else {
            return Err(CommandError::BadParam(token));
        };
        if key.is_empty() {
            return Err(CommandError::BadParam(token));
        }
        let value = if quoted {
            Param::Str(raw.to_string())
        } else {
            parse_param(raw)
        };
        command.params.insert(key.to_string(), value);
    }
    Ok(command)
}

fn tokenize(line: &str) -> Result<Vec<(String, bool)>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quote = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quote => {
                if !current.is_empty() || quoted {
                    tokens.push((std::mem::take(&mut current), quoted));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if in_quote {
        return Err(CommandError::UnterminatedQuote);
    }
    if !current.is_empty() || quoted {
        tokens.push((current, quoted));
    }
    Ok(tokens)
}

fn parse_param(raw: &str) -> Param {
    match raw {
        "true" => return Param::Bool(true),
        "false" => return Param::Bool(false),
        "null" => return Param::Null,
        _ => {}
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return Param::List(Vec::new());
        }
        return Param::List(inner.split(',').map(|item| parse_param(item.trim())).collect());
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Param::Int(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Param::Float(f),
        _ => Param::Str(raw.to_string()),
    }
}

/// Sleep overrides run in whole 5-minute steps, never below 5.
fn sleep_override_minutes(minutes: f64) -> i64 {
    let steps = (minutes.trunc() / 5.0).round() as i64;
    steps.saturating_mul(5).max(5)
}
