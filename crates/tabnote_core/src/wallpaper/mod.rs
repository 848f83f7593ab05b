//! Background wallpaper rotation.

pub mod scheduler;
