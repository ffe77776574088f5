pub mod assignment;
pub mod event;
pub mod rating;
pub mod session;
pub mod statistics;
pub mod user;
