#[allow(clippy::module_inception)]
pub mod error;
pub mod orchestration;
pub mod registry;

pub use error::{CliError, ServiceError};
pub use orchestration::{
    CompilationError, OrchestrationError, RetrievalError, SpecialistError, ValidationError,
};
pub use registry::{PollError, RegistryError};
