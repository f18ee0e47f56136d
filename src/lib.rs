pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod order_state;
pub mod otp;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
