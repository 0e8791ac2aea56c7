//! Localized notification messages.

pub mod catalog;
pub mod renderer;

pub use catalog::Language;
pub use renderer::render;
