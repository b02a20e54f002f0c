mod attachment;
pub mod health;
pub mod render;
pub mod results;
pub mod templates;
pub mod upload;
