/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `serve`: run the HTTP API
- `history`: inspect and delete stored sessions
*/

pub mod history;
pub mod serve;

pub use history::handle_history;
pub use serve::run_server;
