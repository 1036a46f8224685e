//! Everything needed to drive the physical module: the generic device, its protocol variants and
//! the API frames exchanged with the module.

pub mod device;
pub mod frame;
pub mod xbee;

#[cfg(test)]
pub(crate) mod mock;

pub use device::*;
pub use xbee::*;
