pub mod dump;
pub mod info;
pub mod query;
pub mod verify;
