pub mod access;
pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod distribution;
pub mod export;
pub mod intake;
pub mod schema;
pub mod visibility;

#[cfg(test)]
mod fixtures;
