pub mod menu;
pub mod reservation;
pub mod restaurant;
pub mod user;
