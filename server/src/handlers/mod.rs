pub mod confirm;
pub mod health;
pub mod orders;
pub mod registrations;
