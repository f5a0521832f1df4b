pub mod analysis;
pub mod app;
pub mod capability;
pub mod config;
pub mod controls;
pub mod driver;
pub mod export;
pub mod params;
pub mod presets;
pub mod raster;
pub mod render;
pub mod shader;
pub mod terminal;
