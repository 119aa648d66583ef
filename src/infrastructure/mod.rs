pub mod bank_sim;
pub mod channel;
pub mod in_memory;
