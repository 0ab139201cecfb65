use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub realtime: RealtimeConfig,
    pub view: ViewConfig,
    pub bindings: Bindings,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the backend, e.g. `https://home.example.net`
    pub base_url: Url,
    /// Raw `Cookie` header value carrying an already-authenticated session
    pub session_cookie: Option<String>,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub base_url: Url,
    pub session_cookie: Option<String>,
    pub role: String,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
}

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub remaining_time_unit: TimeUnit,
    pub outside_location: String,
    pub stale_after: Duration,
    pub avg_rates_debounce: Duration,
    pub outside_stats_debounce: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Seconds,
}

/// Which inbound event names feed which decoder, and where commands go when
/// the realtime channel is down.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    pub events: HashMap<String, EventKind>,
    pub fallback_routes: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PrinterStatus,
    TempHum,
    Image,
    LocationReading,
    Ac,
    AvgRates,
    OutsideStats,
    CarHeaterStatus,
    CarHeaterActionResult,
    Flash,
    Error,
    ServerShutdown,
}

// Serde structs for the optional bindings file
#[derive(Deserialize, Default)]
struct RawBindings {
    #[serde(default)]
    events: HashMap<String, String>,
    #[serde(default)]
    fallback_routes: HashMap<String, String>,
}

fn env_required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let raw_url = env_required("DASHBOARD_URL")?;
        let base_url =
            Url::parse(&raw_url).map_err(|e| format!("DASHBOARD_URL is not a valid URL: {e}"))?;
        let session_cookie = env_optional("DASHBOARD_SESSION_COOKIE");

        let bindings_file = env_or_default("BINDINGS_FILE", "bindings.json".to_string());
        let bindings = load_bindings(&bindings_file)?;

        let remaining_time_unit = parse_time_unit(&env_or_default(
            "REMAINING_TIME_UNIT",
            "minutes".to_string(),
        ))?;

        let config = Self {
            dashboard: DashboardConfig {
                base_url: base_url.clone(),
                session_cookie: session_cookie.clone(),
                http_timeout: Duration::from_secs(env_or_default("HTTP_TIMEOUT_SECS", 10)),
            },
            realtime: RealtimeConfig {
                base_url,
                session_cookie,
                role: env_or_default("SOCKET_ROLE", "view".to_string()),
                reconnect_min: Duration::from_secs(env_or_default("RECONNECT_MIN_SECS", 5)),
                reconnect_max: Duration::from_secs(env_or_default("RECONNECT_MAX_SECS", 60)),
            },
            view: ViewConfig {
                remaining_time_unit,
                outside_location: env_or_default("OUTSIDE_LOCATION", "Parveke".to_string()),
                stale_after: Duration::from_secs(env_or_default::<u64>("STALE_MINUTES", 10) * 60),
                avg_rates_debounce: Duration::from_millis(env_or_default(
                    "AVG_RATES_DEBOUNCE_MS",
                    3000,
                )),
                outside_stats_debounce: Duration::from_millis(env_or_default(
                    "OUTSIDE_STATS_DEBOUNCE_MS",
                    2000,
                )),
            },
            bindings,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        match self.dashboard.base_url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("DASHBOARD_URL must be http or https, got {other}")),
        }
        if self.realtime.role.is_empty() {
            return Err("SOCKET_ROLE must not be empty".into());
        }
        if self.realtime.reconnect_min.is_zero() {
            return Err("RECONNECT_MIN_SECS must be > 0".into());
        }
        if self.realtime.reconnect_max < self.realtime.reconnect_min {
            return Err("RECONNECT_MAX_SECS must be >= RECONNECT_MIN_SECS".into());
        }
        if self.view.stale_after.is_zero() {
            return Err("STALE_MINUTES must be > 0".into());
        }
        Ok(())
    }
}

impl Bindings {
    pub fn kind_of(&self, event: &str) -> Option<EventKind> {
        self.events.get(event).copied()
    }

    pub fn fallback_route(&self, event: &str) -> Option<&str> {
        self.fallback_routes.get(event).map(String::as_str)
    }
}

impl Default for Bindings {
    fn default() -> Self {
        let events = [
            ("status", EventKind::PrinterStatus),
            ("temphum2v", EventKind::TempHum),
            ("image", EventKind::Image),
            ("esp32_temphum", EventKind::LocationReading),
            ("ac_status", EventKind::Ac),
            ("ac_state", EventKind::Ac),
            ("thermostat_status", EventKind::Ac),
            ("sleep_status", EventKind::Ac),
            ("thermo_config", EventKind::Ac),
            ("ac_snapshot", EventKind::Ac),
            ("hvac_avg_rates", EventKind::AvgRates),
            ("outside_stats", EventKind::OutsideStats),
            ("car_heater_status", EventKind::CarHeaterStatus),
            ("car_heater_action_result", EventKind::CarHeaterActionResult),
            ("flash", EventKind::Flash),
            ("error", EventKind::Error),
            ("server_shutdown", EventKind::ServerShutdown),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), kind))
        .collect();

        let fallback_routes = [("car_heater_control", "/api/car_heater/queue")]
            .into_iter()
            .map(|(event, path)| (event.to_string(), path.to_string()))
            .collect();

        Self {
            events,
            fallback_routes,
        }
    }
}

/// Load the bindings file, layered over the defaults. A missing file is not an
/// error; a malformed one is.
fn load_bindings(path: &str) -> Result<Bindings, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Bindings::default()),
        Err(e) => return Err(format!("Failed to read {path}: {e}")),
    };
    parse_bindings(&content).map_err(|e| format!("Failed to parse {path}: {e}"))
}

fn parse_bindings(content: &str) -> Result<Bindings, String> {
    let raw: RawBindings = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut bindings = Bindings::default();

    for (event, kind) in raw.events {
        let kind = parse_event_kind(&kind)
            .ok_or_else(|| format!("event {event} bound to unknown kind '{kind}'"))?;
        bindings.events.insert(event, kind);
    }

    for (event, path) in raw.fallback_routes {
        if !path.starts_with('/') {
            return Err(format!("fallback route for {event} must start with '/'"));
        }
        bindings.fallback_routes.insert(event, path);
    }

    Ok(bindings)
}

fn parse_event_kind(raw: &str) -> Option<EventKind> {
    let kind = match raw {
        "printer_status" => EventKind::PrinterStatus,
        "temphum" => EventKind::TempHum,
        "image" => EventKind::Image,
        "location_reading" => EventKind::LocationReading,
        "ac" => EventKind::Ac,
        "avg_rates" => EventKind::AvgRates,
        "outside_stats" => EventKind::OutsideStats,
        "car_heater_status" => EventKind::CarHeaterStatus,
        "car_heater_action_result" => EventKind::CarHeaterActionResult,
        "flash" => EventKind::Flash,
        "error" => EventKind::Error,
        "server_shutdown" => EventKind::ServerShutdown,
        _ => return None,
    };
    Some(kind)
}

fn parse_time_unit(raw: &str) -> Result<TimeUnit, String> {
    match raw.to_ascii_lowercase().as_str() {
        "minutes" | "min" | "m" => Ok(TimeUnit::Minutes),
        "seconds" | "sec" | "s" => Ok(TimeUnit::Seconds),
        other => Err(format!(
            "REMAINING_TIME_UNIT must be 'minutes' or 'seconds', got '{other}'"
        )),
    }
}
