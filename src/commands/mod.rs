mod config;
mod render;

pub use config::run_config;
pub use render::run_render;
