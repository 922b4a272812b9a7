use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub data: DataConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Result<String, env::VarError>) -> Self {
        let vars = Vars { lookup: &lookup };
        Self {
            api: ApiConfig::from_vars(&vars),
            data: DataConfig::from_vars(&vars),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "PACKWISE_API_HOST";
    const PORT_VAR: &'static str = "PACKWISE_API_PORT";

    fn from_vars(vars: &Vars<'_>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let host_value = vars
            .string(Self::HOST_VAR)
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (default_ip, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match vars.string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Locations of the box catalog and material factor tables.
#[derive(Clone, Debug)]
pub struct DataConfig {
    box_catalog: PathBuf,
    material_data: PathBuf,
}

impl DataConfig {
    const DEFAULT_BOX_CATALOG: &'static str = "data/boxes.csv";
    const DEFAULT_MATERIAL_DATA: &'static str = "data/material_carbon_data.csv";
    const BOX_CATALOG_VAR: &'static str = "PACKWISE_BOX_CATALOG";
    const MATERIAL_DATA_VAR: &'static str = "PACKWISE_MATERIAL_DATA";

    pub fn new(box_catalog: impl Into<PathBuf>, material_data: impl Into<PathBuf>) -> Self {
        Self {
            box_catalog: box_catalog.into(),
            material_data: material_data.into(),
        }
    }

    fn from_vars(vars: &Vars<'_>) -> Self {
        Self::new(
            vars.string(Self::BOX_CATALOG_VAR)
                .unwrap_or_else(|| Self::DEFAULT_BOX_CATALOG.to_string()),
            vars.string(Self::MATERIAL_DATA_VAR)
                .unwrap_or_else(|| Self::DEFAULT_MATERIAL_DATA.to_string()),
        )
    }

    /// CSV file with one row per box type.
    pub fn box_catalog(&self) -> &Path {
        &self.box_catalog
    }

    /// CSV file mapping packaging materials to CO2 per kg.
    pub fn material_data(&self) -> &Path {
        &self.material_data
    }
}

/// Output format of the log subscriber.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    json: bool,
    rejected_json: Option<String>,
}

impl LoggingConfig {
    pub const JSON_VAR: &'static str = "PACKWISE_LOG_JSON";

    /// Reads only the logging settings, so the subscriber can be installed
    /// before the rest of the configuration reports problems.
    pub fn from_env() -> Self {
        let lookup = |name: &str| env::var(name);
        Self::from_vars(&Vars { lookup: &lookup })
    }

    fn from_vars(vars: &Vars<'_>) -> Self {
        match vars.string(Self::JSON_VAR) {
            Some(raw) => match parse_bool(&raw) {
                Some(json) => Self {
                    json,
                    rejected_json: None,
                },
                None => Self {
                    json: false,
                    rejected_json: Some(raw),
                },
            },
            None => Self {
                json: false,
                rejected_json: None,
            },
        }
    }

    /// Whether logs are emitted as JSON lines.
    pub fn json(&self) -> bool {
        self.json
    }

    /// Value of `PACKWISE_LOG_JSON` that was not a boolean and got ignored.
    ///
    /// No subscriber exists while this is parsed, so the caller reports it
    /// once logging is up.
    pub fn rejected_json(&self) -> Option<&str> {
        self.rejected_json.as_deref()
    }
}

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Result<String, env::VarError>,
}

impl Vars<'_> {
    fn string(&self, name: &str) -> Option<String> {
        match (self.lookup)(name) {
            Ok(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_owned())
                }
            }
            Err(env::VarError::NotPresent) => None,
            Err(err) => {
                tracing::warn!("Access to {} failed: {}. Using default value.", name, err);
                None
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
