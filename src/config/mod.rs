//! Host configuration loaded from `.biovault.toml`.

pub mod settings;

pub use settings::Settings;
