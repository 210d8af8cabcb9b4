pub mod image_item;
pub mod settings;

pub use image_item::*;
pub use settings::*;
