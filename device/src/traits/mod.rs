pub mod i2c;
pub mod log;
pub mod sensors;
