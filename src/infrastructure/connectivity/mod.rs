pub mod flag;
pub mod http_probe;

pub use flag::ConnectivityFlag;
pub use http_probe::HttpHealthProbe;
