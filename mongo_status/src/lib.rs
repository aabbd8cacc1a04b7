pub mod api;
pub mod checks;
pub mod db;
pub mod log_buffer;
pub mod metrics;
pub mod report;
pub mod settings;
pub mod uri;

#[cfg(test)]
pub mod mocks;
