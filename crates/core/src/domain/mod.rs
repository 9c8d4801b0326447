pub mod identity;
pub mod message;
