pub mod engine;
pub mod helpers;
pub mod store;

pub use engine::RenderEngine;
pub use store::TemplateStore;
