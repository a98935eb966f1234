//! Input processing module
//! Handles file detection, document parsing, and input management

pub mod file_detector;
pub mod document_reader;
pub mod manager;

pub use manager::InputManager;
