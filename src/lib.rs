pub mod config;
pub mod control_system;
pub mod coordinator;
pub mod flow_analyzer;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;
