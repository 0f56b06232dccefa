// Library root: the golf-league draft engine and its persistence adapters.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod ids;
pub mod league;
pub mod order;
pub mod pick;
pub mod player;
pub mod pool;
pub mod recommend;
pub mod roster;
pub mod service;
pub mod session;
pub mod state;
pub mod store;
