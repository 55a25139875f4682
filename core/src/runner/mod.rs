mod background;
mod service;

pub use background::{BackgroundRunner, RegistryProgress, Spawner, TokioSpawner};
pub use service::{ConsultationService, StartReceipt};
