mod tick;
mod user_input;

pub use tick::*;
pub use user_input::*;
