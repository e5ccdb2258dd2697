use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use config::{Config as ConfigLoader, Environment};
use is_terminal::IsTerminal;
use once_cell::sync::Lazy;
use serde::Deserialize;

const PREFIX: &str = "DRIVE";

pub static CONFIG: Lazy<Config> = Lazy::new(|| init_config());

#[derive(Debug, Default)]
pub enum LogStyle {
    #[default]
    Auto,
    Always,
    Never,
}

impl LogStyle {
    pub fn is_color(&self) -> bool {
        match self {
            LogStyle::Auto => std::io::stdout().is_terminal(),
            LogStyle::Always => true,
            LogStyle::Never => false,
        }
    }
}

impl<'de> Deserialize<'de> for LogStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?.to_lowercase();
        match s.as_str() {
            "auto" => Ok(LogStyle::Auto),
            "always" => Ok(LogStyle::Always),
            "never" => Ok(LogStyle::Never),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["auto", "always", "never"],
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Log {
    pub level: String,
    pub style: LogStyle,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: Self::level(),
            style: LogStyle::default(),
        }
    }
}

impl Log {
    fn level() -> String {
        String::from("clouddrive=info")
    }
}

/// Backing store for outstanding refresh tokens.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Lost on restart, which signs every user out.
    #[default]
    Memory,
    Database,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Auth {
    /// Empty means a random secret is generated once and persisted.
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub registry: RegistryKind,
    pub sweep_interval_seconds: u64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_token_ttl_seconds: 15 * 60,
            refresh_token_ttl_seconds: 7 * 24 * 60 * 60,
            registry: RegistryKind::default(),
            sweep_interval_seconds: 3600,
        }
    }
}

impl Auth {
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token_ttl_seconds == 0 {
            return Err("access token ttl must be greater than zero".into());
        }
        if self.refresh_token_ttl_seconds == 0 {
            return Err("refresh token ttl must be greater than zero".into());
        }
        if self.refresh_token_ttl_seconds <= self.access_token_ttl_seconds {
            return Err("refresh token ttl must be greater than access token ttl".into());
        }
        if self.sweep_interval_seconds == 0 {
            return Err("registry sweep interval must be greater than zero".into());
        }
        if !self.access_secret.is_empty() && self.access_secret == self.refresh_secret {
            return Err("access and refresh secrets must differ".into());
        }
        Ok(())
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("access_secret_set", &!self.access_secret.is_empty())
            .field("refresh_secret_set", &!self.refresh_secret.is_empty())
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("registry", &self.registry)
            .field("sweep_interval_seconds", &self.sweep_interval_seconds)
            .finish()
    }
}

/// Account created at startup when `login_id` is set and not yet taken.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Admin {
    pub login_id: String,
    pub password: String,
    pub name: String,
}

impl Admin {
    pub fn is_enabled(&self) -> bool {
        !self.login_id.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.password.len() < 8 {
            return Err("admin password must be at least 8 characters".into());
        }
        Ok(())
    }
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("login_id", &self.login_id)
            .field("name", &self.name)
            .field("password_set", &!self.password.is_empty())
            .finish()
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub log: Log,
    pub addr: SocketAddr,
    pub database_url: String,
    pub production: bool,
    pub cors_origin: String,
    pub auth: Auth,
    pub admin: Admin,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log: Log::default(),
            addr: Self::addr(),
            database_url: Self::database_url(),
            production: false,
            cors_origin: Self::cors_origin(),
            auth: Auth::default(),
            admin: Admin::default(),
        }
    }
}

impl Config {
    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 3000)
    }

    fn database_url() -> String {
        String::from("data/clouddrive.db")
    }

    fn cors_origin() -> String {
        String::from("http://localhost:5173")
    }

    pub fn validate(&self) -> Result<(), String> {
        self.auth.validate()?;
        self.admin.validate()
    }
}

pub fn init_config() -> Config {
    let config = ConfigLoader::builder()
        .add_source(
            Environment::with_prefix(PREFIX)
                .separator("__")
                .prefix_separator("_")
                .try_parsing(true),
        )
        .build()
        .and_then(|cfg| cfg.try_deserialize::<Config>());

    match config {
        Ok(config) => {
            if let Err(err) = config.validate() {
                panic!("{}", err);
            }
            println!("{:#?}", config);
            config
        }
        Err(err) => {
            panic!("{:?}", err);
        }
    }
}
