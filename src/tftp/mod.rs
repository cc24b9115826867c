pub mod client;
pub mod server;
pub mod shared;

/// UDP port both peers use unless told otherwise.
pub const DEFAULT_PORT: u16 = 61125;
