pub mod batch;
pub mod cli;
pub mod report;
pub mod settings;
pub mod stage;
