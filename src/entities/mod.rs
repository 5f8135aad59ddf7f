// Persistence entities
pub mod supplier;
