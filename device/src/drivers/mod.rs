pub mod sensors;
pub mod transport;
