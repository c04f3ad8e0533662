pub mod frame;
pub mod renderer;
pub mod style;

pub use frame::{CursorPos, Frame};
pub use renderer::DiffRenderer;
