pub mod health;
pub mod instance;
