//! Maps written field keys to the UI fragments that display them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::config::ViewConfig;
use crate::http::Snapshot;

use super::format::{self, PLACEHOLDER};
use super::render::Fragment;
use super::state::{ViewState, keys};

pub struct ViewContext<'a> {
    pub state: &'a ViewState,
    pub config: &'a ViewConfig,
    pub now: DateTime<Utc>,
}

/// A set of targets rendered together from one or more fields.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Group {
    Printer(&'static str),
    Progress,
    Layer,
    Timelapse,
    RoomTemperature,
    RoomHumidity,
    Image,
    AcPower,
    AcMode,
    AcFan,
    Thermostat,
    Sleep,
    ThermoInput(&'static str),
    SleepWindow(&'static str),
    AvgRates,
    OutsideRange,
    Car(&'static str),
    CarCommand(String),
    Queue,
    Flash,
    Location(String),
    LocationSummary,
}

const PRINTER_SIMPLE: [&str; 8] = [
    keys::PRINTER_BED_TEMP,
    keys::PRINTER_NOZZLE_TEMP,
    keys::PRINTER_NOZZLE_TYPE,
    keys::PRINTER_NOZZLE_DIAMETER,
    keys::PRINTER_STATUS,
    keys::PRINTER_GCODE_STATUS,
    keys::PRINTER_FILE_NAME,
    keys::PRINTER_REMAINING_TIME,
];

const THERMO_INPUTS: [&str; 8] = [
    keys::THERMO_SETPOINT,
    keys::THERMO_POS_HYSTERESIS,
    keys::THERMO_NEG_HYSTERESIS,
    keys::THERMO_MIN_ON_S,
    keys::THERMO_MIN_OFF_S,
    keys::THERMO_POLL_INTERVAL_S,
    keys::THERMO_SMOOTH_WINDOW,
    keys::THERMO_MAX_STALE_S,
];

const CAR_FIELDS: [&str; 10] = [
    keys::CAR_HEATER_ON,
    keys::CAR_POWER_W,
    keys::CAR_AMBIENT_C,
    keys::CAR_DEVICE_C,
    keys::CAR_VOLTAGE_V,
    keys::CAR_CURRENT_A,
    keys::CAR_ENERGY_LAST_MIN_WH,
    keys::CAR_ENERGY_TOTAL_WH,
    keys::CAR_SOURCE,
    keys::CAR_TIMESTAMP,
];

fn groups_for(key: &str) -> Vec<Group> {
    if let Some(simple) = PRINTER_SIMPLE.iter().find(|k| **k == key) {
        return vec![Group::Printer(*simple)];
    }
    if let Some(input) = THERMO_INPUTS.iter().find(|k| **k == key) {
        return vec![Group::ThermoInput(*input)];
    }
    if let Some(field) = CAR_FIELDS.iter().find(|k| **k == key) {
        return vec![Group::Car(*field)];
    }
    if let Some(action) = key.strip_prefix(keys::CAR_COMMAND_PREFIX) {
        return vec![Group::CarCommand(action.to_string())];
    }
    if let Some((name, field)) = keys::split_location(key) {
        let mut groups = vec![Group::Location(name.to_string())];
        if field == "temperature" {
            groups.push(Group::LocationSummary);
        }
        return groups;
    }

    let group = match key {
        keys::PRINTER_PERCENTAGE => Group::Progress,
        keys::PRINTER_CURRENT_LAYER | keys::PRINTER_TOTAL_LAYERS => Group::Layer,
        keys::PRINTER_PRINT_SPEED => Group::Printer(keys::PRINTER_PRINT_SPEED),
        keys::PRINTER_TIMELAPSE => Group::Timelapse,
        keys::ROOM_TEMPERATURE => Group::RoomTemperature,
        keys::ROOM_HUMIDITY => Group::RoomHumidity,
        keys::CAMERA_IMAGE => Group::Image,
        keys::AC_IS_ON => Group::AcPower,
        keys::AC_MODE => Group::AcMode,
        keys::AC_FAN_SPEED => Group::AcFan,
        keys::THERMOSTAT_ENABLED => Group::Thermostat,
        keys::SLEEP_ENABLED | keys::SLEEP_ACTIVE_NOW | keys::SLEEP_OVERRIDE_UNTIL => Group::Sleep,
        keys::SLEEP_START => Group::SleepWindow(keys::SLEEP_START),
        keys::SLEEP_STOP => Group::SleepWindow(keys::SLEEP_STOP),
        keys::RATES_COOLING
        | keys::RATES_HEATING
        | keys::RATES_COOLING_POWER
        | keys::RATES_HEATING_POWER => Group::AvgRates,
        keys::OUTSIDE_TEMP_MIN
        | keys::OUTSIDE_TEMP_MAX
        | keys::OUTSIDE_HUM_MIN
        | keys::OUTSIDE_HUM_MAX => Group::OutsideRange,
        keys::CAR_QUEUE => Group::Queue,
        keys::FLASH_MESSAGE | keys::FLASH_CATEGORY => Group::Flash,
        _ => return Vec::new(),
    };
    vec![group]
}

fn collect_groups<'k>(written: impl IntoIterator<Item = &'k str>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for key in written {
        for group in groups_for(key) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }
    groups
}

/// Fragments depending on any of the written keys, in first-write order.
pub fn fragments_for(ctx: &ViewContext<'_>, written: &[String]) -> Vec<(String, Fragment)> {
    collect_groups(written.iter().map(String::as_str))
        .iter()
        .flat_map(|group| render_group(ctx, group))
        .collect()
}

/// Every fragment the current state can produce.
pub fn all_fragments(ctx: &ViewContext<'_>) -> Vec<(String, Fragment)> {
    collect_groups(ctx.state.with_prefix("").map(|(key, _)| key.as_str()))
        .iter()
        .flat_map(|group| render_group(ctx, group))
        .collect()
}

/// What a summary pill shows when its snapshot could not be loaded.
pub fn placeholders(snapshot: Snapshot) -> Vec<(String, Fragment)> {
    let dash = |target: &str, label: &str| {
        (
            target.to_string(),
            Fragment::text(format!("{label}: {PLACEHOLDER}")),
        )
    };
    match snapshot {
        Snapshot::AvgRates => vec![
            dash("avgCoolingPill", "Cooling"),
            dash("avgHeatingPill", "Heat"),
        ],
        Snapshot::OutsideStats => vec![
            dash("outsideTempRange", "Temp"),
            dash("outsideHumRange", "Hum"),
        ],
        Snapshot::AcStatus => vec![
            (
                "acStatusPill".to_string(),
                Fragment::with_state("Unknown", "unknown"),
            ),
            ("btnAcPowerToggle".to_string(), Fragment::text("Toggle AC")),
            (
                "thermoStatusPill".to_string(),
                Fragment::with_state(format!("Thermostat {PLACEHOLDER}"), "unknown"),
            ),
            ("btnThermoToggle".to_string(), Fragment::text("Enable Thermostat")),
        ],
        Snapshot::GcodeList => Vec::new(),
    }
}

fn one(target: &str, fragment: Fragment) -> Vec<(String, Fragment)> {
    vec![(target.to_string(), fragment)]
}

fn on_off(flag: bool) -> &'static str {
    format::label(flag, "on", "off")
}

fn render_group(ctx: &ViewContext<'_>, group: &Group) -> Vec<(String, Fragment)> {
    let state = ctx.state;
    match group {
        Group::Printer(key) => render_printer_field(ctx, key),
        Group::Progress => match state.number(keys::PRINTER_PERCENTAGE) {
            Some(p) => vec![
                (
                    "progressPercent".to_string(),
                    Fragment::text(format!("{} %", format::number(p))),
                ),
                (
                    "progressBar".to_string(),
                    Fragment::text(format!("{}%", format::number(p.clamp(0.0, 100.0)))),
                ),
            ],
            None => Vec::new(),
        },
        Group::Layer => match (
            state.number(keys::PRINTER_CURRENT_LAYER),
            state.number(keys::PRINTER_TOTAL_LAYERS),
        ) {
            (Some(current), Some(total)) => one(
                "layerInfo",
                Fragment::text(format!(
                    "Layer {} / {}",
                    format::number(current),
                    format::number(total)
                )),
            ),
            _ => Vec::new(),
        },
        Group::Timelapse => match state.flag(keys::PRINTER_TIMELAPSE) {
            Some(active) => vec![
                (
                    "timelapseStatus".to_string(),
                    Fragment::with_state(
                        format::label(active, "Active", "Inactive"),
                        format::label(active, "active", "inactive"),
                    ),
                ),
                (
                    "cameraView".to_string(),
                    Fragment::text(format::label(active, "image", "live")),
                ),
            ],
            None => Vec::new(),
        },
        Group::RoomTemperature => state
            .number(keys::ROOM_TEMPERATURE)
            .map(|t| one("temperature", Fragment::text(format::temperature(t))))
            .unwrap_or_default(),
        Group::RoomHumidity => state
            .number(keys::ROOM_HUMIDITY)
            .map(|h| one("humidity", Fragment::text(format::humidity(h))))
            .unwrap_or_default(),
        Group::Image => state
            .text(keys::CAMERA_IMAGE)
            .map(|img| one("image", Fragment::text(format!("data:image/jpeg;base64,{img}"))))
            .unwrap_or_default(),
        Group::AcPower => match state.flag(keys::AC_IS_ON) {
            Some(on) => vec![
                (
                    "acStatusPill".to_string(),
                    Fragment::with_state(format::label(on, "ON", "OFF"), on_off(on)),
                ),
                (
                    "btnAcPowerToggle".to_string(),
                    Fragment::text(format::label(on, "Turn AC Off", "Turn AC On")),
                ),
            ],
            None => Vec::new(),
        },
        Group::AcMode => state
            .text(keys::AC_MODE)
            .map(|mode| one("acMode", Fragment::text(mode)))
            .unwrap_or_default(),
        Group::AcFan => state
            .text(keys::AC_FAN_SPEED)
            .map(|fan| one("acFan", Fragment::text(fan)))
            .unwrap_or_default(),
        Group::Thermostat => match state.flag(keys::THERMOSTAT_ENABLED) {
            Some(on) => vec![
                (
                    "thermoStatusPill".to_string(),
                    Fragment::with_state(
                        format::label(on, "Thermostat ON", "Thermostat OFF"),
                        on_off(on),
                    ),
                ),
                (
                    "btnThermoToggle".to_string(),
                    Fragment::text(format::label(on, "Disable Thermostat", "Enable Thermostat")),
                ),
            ],
            None => Vec::new(),
        },
        Group::Sleep => render_sleep(state),
        Group::ThermoInput(key) => render_thermo_input(state, key),
        Group::SleepWindow(key) => {
            let target = if *key == keys::SLEEP_START {
                "sleepStart"
            } else {
                "sleepStop"
            };
            state
                .text(key)
                .and_then(format::clock_hhmm)
                .map(|clock| one(target, Fragment::text(clock)))
                .unwrap_or_default()
        }
        Group::AvgRates => render_avg_rates(state),
        Group::OutsideRange => render_outside_range(state),
        Group::Car(key) => render_car_field(state, key),
        Group::CarCommand(action) => state
            .text(&keys::car_command(action))
            .map(|status| one(&format!("cmdStatus_{action}"), command_status(status)))
            .unwrap_or_default(),
        Group::Queue => state
            .text(keys::CAR_QUEUE)
            .map(|queue| one("queueStatus", queue_status(queue)))
            .unwrap_or_default(),
        Group::Flash => match state.text(keys::FLASH_MESSAGE) {
            Some(message) => one(
                "flash",
                Fragment::with_state(
                    message,
                    state.text(keys::FLASH_CATEGORY).unwrap_or("info"),
                ),
            ),
            None => Vec::new(),
        },
        Group::Location(name) => render_location(ctx, name),
        Group::LocationSummary => render_summary(ctx),
    }
}

fn render_printer_field(ctx: &ViewContext<'_>, key: &str) -> Vec<(String, Fragment)> {
    let state = ctx.state;
    let fragment = match key {
        keys::PRINTER_BED_TEMP => state.number(key).map(format::temperature).map(Fragment::text),
        keys::PRINTER_NOZZLE_TEMP => state.number(key).map(format::temperature).map(Fragment::text),
        keys::PRINTER_NOZZLE_DIAMETER => state
            .number(key)
            .map(|d| Fragment::text(format!("{} mm", format::number(d)))),
        keys::PRINTER_PRINT_SPEED => state
            .number(key)
            .map(|s| Fragment::text(format!("{} mm/s", format::number(s)))),
        keys::PRINTER_STATUS => state
            .text(key)
            .map(|status| Fragment::with_state(status, format::slug(status))),
        keys::PRINTER_REMAINING_TIME => state.number(key).map(|minutes| {
            Fragment::text(
                format::duration_hhmm(minutes, ctx.config.remaining_time_unit)
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            )
        }),
        _ => state.text(key).map(Fragment::text),
    };
    let target = match key {
        keys::PRINTER_BED_TEMP => "bedTemp",
        keys::PRINTER_NOZZLE_TEMP => "nozzleTemp",
        keys::PRINTER_NOZZLE_TYPE => "nozzleType",
        keys::PRINTER_NOZZLE_DIAMETER => "nozzleDiam",
        keys::PRINTER_STATUS => "printerStatus",
        keys::PRINTER_GCODE_STATUS => "gcodeStatus",
        keys::PRINTER_FILE_NAME => "fileName",
        keys::PRINTER_REMAINING_TIME => "remainingTime",
        keys::PRINTER_PRINT_SPEED => "printSpeed",
        _ => return Vec::new(),
    };
    fragment.map(|f| one(target, f)).unwrap_or_default()
}

fn render_sleep(state: &ViewState) -> Vec<(String, Fragment)> {
    let enabled = state.flag(keys::SLEEP_ENABLED);
    let (text, class) = match (enabled, state.flag(keys::SLEEP_ACTIVE_NOW)) {
        (Some(false), _) => ("Sleep OFF".to_string(), "off"),
        (Some(true), Some(true)) => ("Sleep NOW".to_string(), "on"),
        (Some(true), Some(false)) => {
            let until = state
                .text(keys::SLEEP_OVERRIDE_UNTIL)
                .and_then(format::clock_hhmm)
                .map(|clock| format!(" - {clock}"))
                .unwrap_or_default();
            (format!("Sleep Enabled{until}"), "idle")
        }
        _ => (format!("Sleep {PLACEHOLDER}"), "unknown"),
    };

    let mut out = one("sleepStatusPill", Fragment::with_state(text, class));
    if let Some(enabled) = enabled {
        out.push((
            "btnSleepToggle".to_string(),
            Fragment::text(format::label(enabled, "Disable Sleep", "Enable Sleep")),
        ));
    }
    out
}

fn render_thermo_input(state: &ViewState, key: &str) -> Vec<(String, Fragment)> {
    let Some(value) = state.number(key) else {
        return Vec::new();
    };
    let (target, text) = match key {
        keys::THERMO_SETPOINT => ("modalSetpointC", format::one_decimal(value)),
        keys::THERMO_POS_HYSTERESIS => ("modalHysteresisPos", format::one_decimal(value)),
        keys::THERMO_NEG_HYSTERESIS => ("modalHysteresisNeg", format::one_decimal(value)),
        keys::THERMO_MIN_ON_S => ("modalMinOnS", format::number(value)),
        keys::THERMO_MIN_OFF_S => ("modalMinOffS", format::number(value)),
        keys::THERMO_POLL_INTERVAL_S => ("modalPollS", format::number(value)),
        keys::THERMO_SMOOTH_WINDOW => ("modalSmoothWindow", format::number(value)),
        keys::THERMO_MAX_STALE_S => ("modalMaxStaleS", format::number(value)),
        _ => return Vec::new(),
    };
    one(target, Fragment::text(text))
}

fn render_avg_rates(state: &ViewState) -> Vec<(String, Fragment)> {
    // cooling is reported as a negative rate, shown as magnitude
    let cooling = state
        .number(keys::RATES_COOLING)
        .map(|r| format::rate(r.abs()))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let heating = state
        .number(keys::RATES_HEATING)
        .map(format::rate)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    vec![
        (
            "avgCoolingPill".to_string(),
            Fragment::text(format!(
                "Cooling: {cooling}{}",
                format::power_suffix(state.number(keys::RATES_COOLING_POWER))
            )),
        ),
        (
            "avgHeatingPill".to_string(),
            Fragment::text(format!(
                "Heat: {heating}{}",
                format::power_suffix(state.number(keys::RATES_HEATING_POWER))
            )),
        ),
    ]
}

fn render_outside_range(state: &ViewState) -> Vec<(String, Fragment)> {
    let temp = match (
        state.number(keys::OUTSIDE_TEMP_MIN),
        state.number(keys::OUTSIDE_TEMP_MAX),
    ) {
        (Some(lo), Some(hi)) => format!("Temp: {lo:.1} - {hi:.1}°C"),
        _ => format!("Temp: {PLACEHOLDER}"),
    };
    let hum = match (
        state.number(keys::OUTSIDE_HUM_MIN),
        state.number(keys::OUTSIDE_HUM_MAX),
    ) {
        (Some(lo), Some(hi)) => format!(
            "Hum: {} - {}%",
            format::round_half_up(lo),
            format::round_half_up(hi)
        ),
        _ => format!("Hum: {PLACEHOLDER}"),
    };
    vec![
        ("outsideTempRange".to_string(), Fragment::text(temp)),
        ("outsideHumRange".to_string(), Fragment::text(hum)),
    ]
}

fn render_car_field(state: &ViewState, key: &str) -> Vec<(String, Fragment)> {
    let num = |digits: usize, unit: &str| {
        state
            .number(key)
            .map(|v| format::with_unit(v, unit, digits))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };
    match key {
        keys::CAR_HEATER_ON => match state.flag(key) {
            Some(on) => one(
                "heaterStatePill",
                Fragment::with_state(format::label(on, "Heater ON", "Heater OFF"), on_off(on)),
            ),
            None => Vec::new(),
        },
        keys::CAR_POWER_W => {
            let power = num(1, " W");
            vec![
                ("powerPill".to_string(), Fragment::text(format!("Power: {power}"))),
                ("instantPowerValue".to_string(), Fragment::text(power)),
            ]
        }
        keys::CAR_AMBIENT_C => {
            let ambient = num(1, " °C");
            vec![
                ("ambientPill".to_string(), Fragment::text(format!("Ambient: {ambient}"))),
                ("ambientTempValue".to_string(), Fragment::text(ambient)),
            ]
        }
        keys::CAR_DEVICE_C => {
            let device = num(1, " °C");
            let heat = match state.number(key) {
                Some(t) if t >= 40.0 => "hot",
                Some(t) if t >= 30.0 => "warm",
                _ => "muted",
            };
            vec![
                (
                    "deviceTempPill".to_string(),
                    Fragment::with_state(format!("Device: {device}"), heat),
                ),
                ("deviceTempValue".to_string(), Fragment::text(device)),
            ]
        }
        keys::CAR_VOLTAGE_V => one("voltagePill", Fragment::text(format!("U: {}", num(1, " V")))),
        keys::CAR_CURRENT_A => one("currentPill", Fragment::text(format!("I: {}", num(2, " A")))),
        keys::CAR_ENERGY_LAST_MIN_WH => state
            .number(key)
            .map(|wh| {
                one(
                    "energyLastMinValue",
                    Fragment::text(format!("{} Wh (last min)", format::number(wh))),
                )
            })
            .unwrap_or_default(),
        keys::CAR_ENERGY_TOTAL_WH => state
            .number(key)
            .map(|wh| one("energyTotalValue", Fragment::text(format!("{} Wh", format::number(wh)))))
            .unwrap_or_default(),
        keys::CAR_SOURCE => {
            let source = state.text(key).filter(|s| !s.is_empty()).unwrap_or(PLACEHOLDER);
            one("sourceValue", Fragment::text(source))
        }
        keys::CAR_TIMESTAMP => state
            .text(key)
            .map(|ts| one("tsValue", Fragment::text(format::local_timestamp(ts))))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn command_status(status: &str) -> Fragment {
    match status {
        "queued" => Fragment::with_state("Queued", "queued"),
        "sent" => Fragment::with_state("Sent to ESP", "sent"),
        "success" => Fragment::with_state("Success", "sent"),
        "failed" => Fragment::with_state("Failed", "error"),
        other => Fragment::text(other),
    }
}

fn queue_status(queue: &str) -> Fragment {
    match queue {
        "pending" => Fragment::with_state("Action queued…", "pending"),
        "queued" => Fragment::with_state("Action queued", "pending"),
        "delivered" => Fragment::with_state("Last command sent to car", "sent"),
        "accepted" => Fragment::with_state("Last action sent", "sent"),
        "rejected" => Fragment::with_state("Action failed", "idle"),
        "failed" => Fragment::with_state("Failed to queue action", "idle"),
        other => Fragment::text(other),
    }
}

struct Reading {
    name: String,
    temperature: Option<f64>,
}

fn readings(state: &ViewState) -> Vec<Reading> {
    let names: BTreeSet<&str> = state
        .with_prefix(keys::LOCATION_PREFIX)
        .filter_map(|(key, _)| keys::split_location(key).map(|(name, _)| name))
        .collect();
    names
        .into_iter()
        .map(|name| Reading {
            name: name.to_string(),
            temperature: state.number(&keys::location(name, "temperature")),
        })
        .collect()
}

/// Fresh when the reading's own timestamp, or failing that the time it was
/// received, lies within the stale window.
fn is_fresh(ctx: &ViewContext<'_>, name: &str) -> bool {
    let observed = ctx
        .state
        .text(&keys::location(name, "timestamp"))
        .and_then(format::parse_timestamp)
        .or_else(|| {
            ["temperature", "humidity"]
                .iter()
                .filter_map(|field| ctx.state.get(&keys::location(name, field)))
                .map(|entry| entry.received_at)
                .max()
        });
    let Some(observed) = observed else {
        return false;
    };
    match (ctx.now - observed).to_std() {
        Ok(age) => age <= ctx.config.stale_after,
        // timestamps slightly in the future count as fresh
        Err(_) => true,
    }
}

fn render_location(ctx: &ViewContext<'_>, name: &str) -> Vec<(String, Fragment)> {
    let state = ctx.state;
    let temp = state
        .number(&keys::location(name, "temperature"))
        .map(format::temperature)
        .unwrap_or_else(|| "-".to_string());
    let hum = state
        .number(&keys::location(name, "humidity"))
        .map(format::humidity)
        .unwrap_or_else(|| "-".to_string());
    let seen = state
        .text(&keys::location(name, "timestamp"))
        .map(format::local_timestamp)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let ac = match state.flag(&keys::location(name, "ac_on")) {
        Some(true) => " · AC",
        _ => "",
    };

    let text = format!("{name}: {temp} · {hum} · {seen}{ac}");
    let freshness = if is_fresh(ctx, name) { "fresh" } else { "stale" };
    one(
        &format!("loc-{}", format::slug(name)),
        Fragment::with_state(text, freshness),
    )
}

fn render_summary(ctx: &ViewContext<'_>) -> Vec<(String, Fragment)> {
    let outside = ctx.config.outside_location.trim();
    let inside: Vec<(String, f64)> = readings(ctx.state)
        .into_iter()
        .filter(|r| r.name.trim() != outside)
        .filter_map(|r| r.temperature.map(|t| (r.name, t)))
        .collect();

    let pill = |target: &str, text: String| (target.to_string(), Fragment::text(text));

    if inside.is_empty() {
        return vec![
            pill("avgTempPill", format!("AVG: {PLACEHOLDER}")),
            pill("minTempPill", format!("Min: {PLACEHOLDER}")),
            pill("maxTempPill", format!("Max: {PLACEHOLDER}")),
        ];
    }

    let avg = inside.iter().map(|(_, t)| t).sum::<f64>() / inside.len() as f64;
    let mut min = &inside[0];
    let mut max = &inside[0];
    for reading in &inside {
        if reading.1 < min.1 {
            min = reading;
        }
        if reading.1 > max.1 {
            max = reading;
        }
    }
    vec![
        pill("avgTempPill", format!("AVG: {avg:.1}°C")),
        pill("minTempPill", format!("Min: {:.1}°C ({})", min.1, min.0)),
        pill("maxTempPill", format!("Max: {:.1}°C ({})", max.1, max.0)),
    ]
}
