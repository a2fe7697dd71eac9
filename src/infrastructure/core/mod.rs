pub mod http_client_factory;
pub mod keyed_lock;

pub use http_client_factory::HttpClientFactory;
pub use keyed_lock::KeyedLock;
