//! Http server simulating slow responses, used to manually exercise http
//! cache clients (eg. to check behaviour when a download is interrupted or
//! takes longer than expected).
//!
//! See [responder::respond] for supported requests and [server::serve] for
//! the server loop.

#![warn(missing_docs)]

pub mod responder;
pub mod server;
