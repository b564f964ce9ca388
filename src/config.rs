use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::rest::DEFAULT_REST_URL;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_BIOTYPE: &str = "protein_coding";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, alias = "pass")]
    pub password: Option<String>,
    #[serde(default)]
    pub dbname: Option<String>,
}

impl DbSettings {
    pub fn overlay(self, over: DbSettings) -> DbSettings {
        DbSettings {
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            user: over.user.or(self.user),
            password: over.password.or(self.password),
            dbname: over.dbname.or(self.dbname),
        }
    }

    fn is_blank(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.dbname.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub core: DbSettings,
    #[serde(default)]
    pub dna: DbSettings,
    #[serde(default)]
    pub rest: RestSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnaSource {
    Core,
    Database(DbConfig),
    Rest { url: String, species: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub core: DbConfig,
    pub dna: DnaSource,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Utf8Path) -> Result<Settings, ExportError> {
        let content =
            fs::read_to_string(path).map_err(|_| ExportError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| ExportError::ConfigParse(err.to_string()))
    }

    pub fn resolve(path: Option<&Utf8Path>, cli: Settings) -> Result<ResolvedConfig, ExportError> {
        let file = match path {
            Some(path) => Self::load(path)?,
            None => Settings::default(),
        };
        Self::resolve_settings(file, cli)
    }

    pub fn resolve_settings(file: Settings, cli: Settings) -> Result<ResolvedConfig, ExportError> {
        let core = resolve_core(file.core.overlay(cli.core))?;
        let dna = file.dna.overlay(cli.dna);
        let rest = RestSettings {
            url: cli.rest.url.or(file.rest.url),
            species: cli.rest.species.or(file.rest.species),
        };

        let dna = if rest.url.is_some() || rest.species.is_some() {
            let species = rest.species.ok_or_else(|| {
                ExportError::InvalidConfig(
                    "--species is required with a REST sequence backend".to_string(),
                )
            })?;
            if !dna.is_blank() {
                tracing::warn!("both a DNA database and a REST backend are configured; using REST");
            }
            DnaSource::Rest {
                url: rest.url.unwrap_or_else(|| DEFAULT_REST_URL.to_string()),
                species,
            }
        } else {
            resolve_dna(dna)
        };

        Ok(ResolvedConfig { core, dna })
    }
}

fn resolve_core(settings: DbSettings) -> Result<DbConfig, ExportError> {
    Ok(DbConfig {
        host: non_empty(settings.host).ok_or(ExportError::MissingParameter("host"))?,
        port: settings.port.unwrap_or(DEFAULT_PORT),
        user: non_empty(settings.user).ok_or(ExportError::MissingParameter("user"))?,
        password: settings.password,
        dbname: non_empty(settings.dbname).ok_or(ExportError::MissingParameter("dbname"))?,
    })
}

fn resolve_dna(settings: DbSettings) -> DnaSource {
    if settings.is_blank() {
        return DnaSource::Core;
    }
    match (
        non_empty(settings.host.clone()),
        settings.port,
        non_empty(settings.user.clone()),
        non_empty(settings.dbname.clone()),
    ) {
        (Some(host), Some(port), Some(user), Some(dbname)) => DnaSource::Database(DbConfig {
            host,
            port,
            user,
            password: settings.password,
            dbname,
        }),
        _ => {
            tracing::warn!(
                host = settings.host.is_some(),
                port = settings.port.is_some(),
                user = settings.user.is_some(),
                dbname = settings.dbname.is_some(),
                "incomplete DNA database settings ignored; reading sequence from the core database"
            );
            DnaSource::Core
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
