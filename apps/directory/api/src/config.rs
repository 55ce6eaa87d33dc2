use core_config::{app_info, env_parse_or_default, server::ServerConfig, AppInfo, FromEnv};
use database::postgres::PostgresConfig;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Where user records live
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserStore {
    Postgres,
    /// Process-local; data is lost on restart
    Memory,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: UserStore,
    /// Present only when `store` is [`UserStore::Postgres`]
    pub database: Option<PostgresConfig>,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let store: UserStore = env_parse_or_default("USER_STORE", "postgres")?;

        let database = match store {
            UserStore::Postgres => Some(PostgresConfig::from_env()?), // DATABASE_URL required
            UserStore::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            database,
            run_migrations: env_parse_or_default("RUN_MIGRATIONS", "true")?,
        })
    }
}
