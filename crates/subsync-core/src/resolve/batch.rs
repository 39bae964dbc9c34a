//! Hostname deduplication for batched lookups

use crate::traits::Server;
use std::collections::BTreeSet;

/// Distinct hostnames of `servers`
///
/// The ordered set keeps resolver invocations deterministic for equal
/// inputs; callers must not rely on the order otherwise.
pub fn distinct_hostnames(servers: &[Server]) -> BTreeSet<String> {
    servers.iter().map(|server| server.hostname.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(distinct_hostnames(&[]).is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let servers = vec![
            Server::new("example.com", 443),
            Server::new("other.test", 8388),
            Server::new("example.com", 8443),
            Server::new("1.2.3.4", 80),
        ];

        let hostnames = distinct_hostnames(&servers);

        assert!(hostnames.len() <= servers.len());
        assert_eq!(
            hostnames.into_iter().collect::<Vec<_>>(),
            vec!["1.2.3.4", "example.com", "other.test"]
        );
    }

    #[test]
    fn equal_inputs_in_any_order_give_equal_sets() {
        let a = vec![Server::new("b.test", 1), Server::new("a.test", 2)];
        let b = vec![Server::new("a.test", 2), Server::new("b.test", 1), Server::new("a.test", 3)];
        assert_eq!(distinct_hostnames(&a), distinct_hostnames(&b));
    }
}
