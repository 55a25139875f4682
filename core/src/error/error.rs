use thiserror::Error;

use super::registry::RegistryError;

/// Top-level failure of a `consilium` invocation; the binary maps each variant to an exit code.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("{0}")]
    Command(String),
    #[error("task registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised while wiring collaborators from config.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid collaborator settings: {0}")]
    Config(String),
    #[error("failed to build collaborators: {0:#}")]
    Plugin(#[from] anyhow::Error),
}
