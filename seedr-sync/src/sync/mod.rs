pub mod blocking;
pub mod cleanup;
pub mod download;
pub mod driver;
pub mod lister;
pub mod model;
pub mod paths;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod testing;
