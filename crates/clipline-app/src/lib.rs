// crates/clipline-app/src/lib.rs
//
// Inbound/outbound boundary of clipline: the Session facade that a drawing
// surface (or the headless `clipline` binary) drives, plus app-level config.

pub mod config;
pub mod report;
pub mod session;

pub use config::AppConfig;
pub use report::LayoutReport;
pub use session::{ClipHandle, Session};
