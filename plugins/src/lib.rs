pub mod compiler;
pub mod factory;
pub mod http;
pub mod llm;
pub mod retrieval;
pub mod services;
pub mod specialists;
