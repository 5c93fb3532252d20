pub mod classify;
pub mod investigate;
pub mod score;
pub mod verify;
