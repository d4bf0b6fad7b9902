mod device_config;
mod device_id;
mod filter_mode;
mod reading;

pub use device_config::{ConfigRequest, DeviceConfig};
pub use device_id::DeviceId;
pub use filter_mode::FilterMode;
pub use reading::{Reading, ReadingStatus};
