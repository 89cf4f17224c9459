pub mod admin;
pub mod doctor;
pub mod user;
