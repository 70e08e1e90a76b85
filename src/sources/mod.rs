//! Message source implementations

pub mod ntrip;
