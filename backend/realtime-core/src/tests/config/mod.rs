mod client_config;
mod params;
