pub mod catalog;
pub mod error;
pub mod inference;
pub mod preview;
pub mod stage_manager;
pub mod storage;
pub mod upload_service;
