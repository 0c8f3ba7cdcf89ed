//! Page classification seam

use crate::error::RsaResult;
use crate::net::FetchedPage;
use crate::rule::TechnologyMap;

/// Turns a fetched page into detected technologies. Must not touch the network.
pub trait Classifier: Send + Sync {
    fn classify(&self, page: &FetchedPage) -> RsaResult<TechnologyMap>;
}
