pub mod audit;
pub mod item;
pub mod notification;
pub mod token;
pub mod user;
