pub mod rest_client;

pub use rest_client::RestCollection;
