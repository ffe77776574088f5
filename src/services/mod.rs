pub mod assignments;
pub mod events;
pub mod ratings;
pub mod sessions;
pub mod statistics;
pub mod users;
