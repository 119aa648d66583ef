pub mod bank;
pub mod ports;
pub mod session;
