pub mod api;
pub mod backend;
pub mod bus;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod debounce;
pub mod filters;
pub mod logging;
pub mod moderation;
pub mod pages;
pub mod ports;
pub mod query;
pub mod review;
pub mod selection;
pub mod store;
pub mod toolbar;
pub mod ui;
