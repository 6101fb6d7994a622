mod client;
mod error;
mod helpers;
