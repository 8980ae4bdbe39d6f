/// Graphics device module - GPU abstraction and the headless backend

// Module declarations
pub mod device;
pub mod texture;
pub mod frame_buffer;
pub mod headless;

// Re-export everything from device.rs
pub use device::*;

// Re-export from other modules
pub use texture::*;
pub use frame_buffer::*;
pub use headless::{HeadlessDevice, DeviceCommand, LayerContents};
