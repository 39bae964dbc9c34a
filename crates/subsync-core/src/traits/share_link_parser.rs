// # Share-Link Parser Trait
//
// Turns raw subscription payload text into server records. The payload
// format is opaque to the sync core.

use super::server_store::Server;

/// Trait for subscription payload parsers
///
/// Parsing is synchronous and pure: no I/O, no knowledge of the subscription
/// the text came from. Group labels are assigned later by the fetch task.
pub trait ShareLinkParser: Send + Sync {
    /// Parse a subscription payload
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Server>)`: Parsed servers (may be empty)
    /// - `Err(Error::Parse)`: The payload could not be parsed
    fn parse(&self, text: &str) -> Result<Vec<Server>, crate::Error>;

    /// Get the parser name (for logging/debugging)
    fn parser_name(&self) -> &'static str;
}
