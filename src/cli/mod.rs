pub mod holdings;
pub mod manage;
pub mod price;
pub mod setup;
pub mod summary;
pub mod ui;
