mod config;
mod connection;
mod dispatch;
mod events;
mod protocol;
