pub mod device;
pub mod dtos;
pub mod session;

pub use device::{DeviceCode, DeviceRecord, DeviceStatus};
pub use session::Session;
