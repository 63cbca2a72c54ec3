mod client;
mod error;
mod server;

pub use client::{CloudProvider, HetznerClient};
pub use error::HetznerError;
pub use server::{CreateServer, ImageRef, Ipv4, PublicNet, Server};
