pub mod app;
pub mod chain;
pub mod config;
pub mod cors;
pub mod error;
pub mod exception;
pub mod logger;
pub mod param;
pub mod path;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use app::App;
pub use chain::{handler, Chain, Handler, Next};
pub use config::Config;
pub use cors::CorsConfig;
pub use error::DispatchError;
pub use exception::Exception;
pub use logger::{LogEvent, LogKind, LogSink};
pub use param::{HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::{Body, Response};
pub use router::Router;
