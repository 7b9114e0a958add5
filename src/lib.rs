//! Rentwear Backend Library
//!
//! Core modules for the Rentwear rental server and its sync client.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rental;
pub mod routes;
pub mod state;
pub mod sync;
pub mod wallet;
pub mod websocket;
