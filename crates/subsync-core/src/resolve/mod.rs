// # Forced Resolution
//
// Hostname batching and in-place rewriting for the "force resolution"
// feature. The lookup transport itself sits behind `ResolverBackend`.

pub mod batch;
pub mod forced;

pub use batch::distinct_hostnames;
pub use forced::{ForcedDnsResolver, MISSING_UPSTREAM_PROXY};
