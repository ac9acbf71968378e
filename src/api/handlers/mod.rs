pub mod health;
pub mod pages;
pub mod stages;
pub mod text;
