mod close_code;
mod codec;
