//! VisionBoard engine: the board model, gesture resolution and the image
//! effects pipeline. The GUI and CLI in the binary target are thin layers on
//! top of this crate.

pub mod board;
pub mod elements;
pub mod gesture;
pub mod io;
pub mod logger;
pub mod ops;
pub mod render;
pub mod settings;
