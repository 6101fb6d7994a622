mod reconnect;
mod state;
