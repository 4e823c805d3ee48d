//! Wire types: the proxy's own endpoints and the upstream chat completion API

mod openai;
mod proofread;

pub use openai::*;
pub use proofread::*;
