//! Configuration for SuperScan.
//!
//! Backend credentials and client settings ([`settings::Config`]) are read
//! from a TOML file at startup and can be overridden from the environment.

pub mod settings;
