//! Host discovery and TCP connect port scanning, exposed as reusable modules.
pub mod cli;
pub mod report;
pub mod scanner;
