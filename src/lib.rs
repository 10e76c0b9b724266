pub mod app;
pub mod config;
pub mod error;
pub mod features;
pub mod host;
pub mod models;
pub mod store;
pub mod views;

pub use app::{App, Feature};
pub use config::HostConfig;
pub use error::ShellError;
pub use host::Host;
