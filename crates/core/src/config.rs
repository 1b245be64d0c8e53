use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::group::GroupRef;
use crate::domain::identity::MailAddress;
use crate::hierarchy::DEFAULT_MAX_HOPS;
use crate::roles::{RoleSentinels, DEFAULT_AREA_MANAGER_GROUP};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    pub roles: RolesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub url: String,
    pub base_dn: String,
    pub bind_dn: String,
    pub bind_password: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RolesConfig {
    pub general_manager_mail: String,
    pub hr_manager_mail: Option<String>,
    pub area_manager_mail: Option<String>,
    pub area_manager_group: String,
    pub max_hops: u8,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub directory_url: Option<String>,
    pub general_manager_mail: Option<String>,
    pub hr_manager_mail: Option<String>,
    pub area_manager_mail: Option<String>,
    pub area_manager_group: Option<String>,
    pub max_hops: Option<u8>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig {
                url: "ldap://localhost:389".to_string(),
                base_dn: String::new(),
                bind_dn: String::new(),
                bind_password: String::new().into(),
                timeout_secs: 10,
            },
            roles: RolesConfig {
                general_manager_mail: String::new(),
                hr_manager_mail: None,
                area_manager_mail: None,
                area_manager_group: DEFAULT_AREA_MANAGER_GROUP.to_string(),
                max_hops: DEFAULT_MAX_HOPS,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl RolesConfig {
    /// Projects the validated role settings into the immutable sentinel
    /// set the resolvers consume. Blank optional mails count as unset.
    pub fn sentinels(&self) -> RoleSentinels {
        let mut sentinels = RoleSentinels::new(MailAddress::new(self.general_manager_mail.trim()))
            .with_area_manager_group(GroupRef::from(self.area_manager_group.as_str()));
        if let Some(mail) = non_blank(self.hr_manager_mail.as_deref()) {
            sentinels = sentinels.with_hr_manager(MailAddress::new(mail));
        }
        if let Some(mail) = non_blank(self.area_manager_mail.as_deref()) {
            sentinels = sentinels.with_area_manager_override(MailAddress::new(mail));
        }
        sentinels
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("escalera.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(directory) = patch.directory {
            if let Some(url) = directory.url {
                self.directory.url = url;
            }
            if let Some(base_dn) = directory.base_dn {
                self.directory.base_dn = base_dn;
            }
            if let Some(bind_dn) = directory.bind_dn {
                self.directory.bind_dn = bind_dn;
            }
            if let Some(bind_password_value) = directory.bind_password {
                self.directory.bind_password = secret_value(bind_password_value);
            }
            if let Some(timeout_secs) = directory.timeout_secs {
                self.directory.timeout_secs = timeout_secs;
            }
        }

        if let Some(roles) = patch.roles {
            if let Some(general_manager_mail) = roles.general_manager_mail {
                self.roles.general_manager_mail = general_manager_mail;
            }
            if let Some(hr_manager_mail) = roles.hr_manager_mail {
                self.roles.hr_manager_mail = Some(hr_manager_mail);
            }
            if let Some(area_manager_mail) = roles.area_manager_mail {
                self.roles.area_manager_mail = Some(area_manager_mail);
            }
            if let Some(area_manager_group) = roles.area_manager_group {
                self.roles.area_manager_group = area_manager_group;
            }
            if let Some(max_hops) = roles.max_hops {
                self.roles.max_hops = max_hops;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ESCALERA_DIRECTORY_URL") {
            self.directory.url = value;
        }
        if let Some(value) = read_env("ESCALERA_DIRECTORY_BASE_DN") {
            self.directory.base_dn = value;
        }
        if let Some(value) = read_env("ESCALERA_DIRECTORY_BIND_DN") {
            self.directory.bind_dn = value;
        }
        if let Some(value) = read_env("ESCALERA_DIRECTORY_BIND_PASSWORD") {
            self.directory.bind_password = secret_value(value);
        }
        if let Some(value) = read_env("ESCALERA_DIRECTORY_TIMEOUT_SECS") {
            self.directory.timeout_secs = parse_u64("ESCALERA_DIRECTORY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESCALERA_ROLES_GENERAL_MANAGER_MAIL") {
            self.roles.general_manager_mail = value;
        }
        if let Some(value) = read_env("ESCALERA_ROLES_HR_MANAGER_MAIL") {
            self.roles.hr_manager_mail = Some(value);
        }
        if let Some(value) = read_env("ESCALERA_ROLES_AREA_MANAGER_MAIL") {
            self.roles.area_manager_mail = Some(value);
        }
        if let Some(value) = read_env("ESCALERA_ROLES_AREA_MANAGER_GROUP") {
            self.roles.area_manager_group = value;
        }
        if let Some(value) = read_env("ESCALERA_ROLES_MAX_HOPS") {
            self.roles.max_hops = parse_u8("ESCALERA_ROLES_MAX_HOPS", &value)?;
        }

        let log_level =
            read_env("ESCALERA_LOGGING_LEVEL").or_else(|| read_env("ESCALERA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ESCALERA_LOGGING_FORMAT").or_else(|| read_env("ESCALERA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(directory_url) = overrides.directory_url {
            self.directory.url = directory_url;
        }
        if let Some(general_manager_mail) = overrides.general_manager_mail {
            self.roles.general_manager_mail = general_manager_mail;
        }
        if let Some(hr_manager_mail) = overrides.hr_manager_mail {
            self.roles.hr_manager_mail = Some(hr_manager_mail);
        }
        if let Some(area_manager_mail) = overrides.area_manager_mail {
            self.roles.area_manager_mail = Some(area_manager_mail);
        }
        if let Some(area_manager_group) = overrides.area_manager_group {
            self.roles.area_manager_group = area_manager_group;
        }
        if let Some(max_hops) = overrides.max_hops {
            self.roles.max_hops = max_hops;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_directory(&self.directory)?;
        validate_roles(&self.roles)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// The role sentinels described by this configuration.
    pub fn sentinels(&self) -> RoleSentinels {
        self.roles.sentinels()
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("escalera.toml"), PathBuf::from("config/escalera.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_directory(directory: &DirectoryConfig) -> Result<(), ConfigError> {
    let url = directory.url.trim();
    if !url.starts_with("ldap://") && !url.starts_with("ldaps://") {
        return Err(ConfigError::Validation(
            "directory.url must be an LDAP URL (`ldap://...` or `ldaps://...`)".to_string(),
        ));
    }

    if directory.timeout_secs == 0 || directory.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "directory.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let bind_dn = directory.bind_dn.trim();
    if !bind_dn.is_empty() && directory.bind_password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "directory.bind_password is required when directory.bind_dn is set".to_string(),
        ));
    }

    Ok(())
}

fn validate_roles(roles: &RolesConfig) -> Result<(), ConfigError> {
    let general_manager_mail = roles.general_manager_mail.trim();
    if general_manager_mail.is_empty() {
        return Err(ConfigError::Validation(
            "roles.general_manager_mail is required to recognize the top of the organization"
                .to_string(),
        ));
    }
    if !general_manager_mail.contains('@') {
        return Err(ConfigError::Validation(
            "roles.general_manager_mail must be a mail address".to_string(),
        ));
    }

    if let Some(mail) = non_blank(roles.hr_manager_mail.as_deref()) {
        if !mail.contains('@') {
            return Err(ConfigError::Validation(
                "roles.hr_manager_mail must be a mail address when set".to_string(),
            ));
        }
    }
    if let Some(mail) = non_blank(roles.area_manager_mail.as_deref()) {
        if !mail.contains('@') {
            return Err(ConfigError::Validation(
                "roles.area_manager_mail must be a mail address when set".to_string(),
            ));
        }
    }

    if roles.area_manager_group.trim().is_empty() {
        return Err(ConfigError::Validation(
            "roles.area_manager_group must not be blank".to_string(),
        ));
    }

    if roles.max_hops == 0 || roles.max_hops > 32 {
        return Err(ConfigError::Validation("roles.max_hops must be in range 1..=32".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|raw| !raw.is_empty())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    directory: Option<DirectoryPatch>,
    roles: Option<RolesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPatch {
    url: Option<String>,
    base_dn: Option<String>,
    bind_dn: Option<String>,
    bind_password: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RolesPatch {
    general_manager_mail: Option<String>,
    hr_manager_mail: Option<String>,
    area_manager_mail: Option<String>,
    area_manager_group: Option<String>,
    max_hops: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
