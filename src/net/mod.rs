//! Network layer: resolver guard, HTTP transport and the retrying fetcher
pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod transport;
pub mod user_agent;

#[cfg(test)]
pub(crate) mod testing;

pub use self::error::{FetchError, TransportError};
pub use self::fetcher::Fetcher;
pub use self::resolver::{Resolver, SystemResolver};
pub use self::transport::{FetchRequest, FetchedPage, HttpTransport, ReqwestTransport};
pub use self::user_agent::{UserAgentMode, USER_AGENTS};
