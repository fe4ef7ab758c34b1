pub mod config;
pub mod core;
pub mod gpa;
pub mod grades;
pub mod scores;
