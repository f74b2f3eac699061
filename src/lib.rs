pub mod api;
pub mod audit;
pub mod config;
pub mod corridor;
pub mod engine;
pub mod error;
pub mod explain;
pub mod forecast;
pub mod persistence;
pub mod recommend;
pub mod state;
