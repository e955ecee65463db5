pub mod cli;
pub mod config;
pub mod connection;
pub mod encode;
pub mod event;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod publisher;
pub mod source;
