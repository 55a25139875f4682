pub mod compiler;
pub mod retrieval;
pub mod specialist;

pub use compiler::*;
pub use retrieval::*;
pub use specialist::*;
