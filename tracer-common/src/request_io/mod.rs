mod inputs;
mod outputs;

pub use inputs::*;
pub use outputs::*;
