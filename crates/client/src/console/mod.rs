//! Line-oriented terminal surface: operator input and the chat transcript

mod input;
mod transcript;

pub use input::*;
pub use transcript::*;
