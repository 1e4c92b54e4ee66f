//! `newt` is a CoAP protocol engine for devices with kilobytes of RAM.
//!
//! ## CoAP
//! CoAP is an application-level network protocol that copies the semantics of HTTP
//! to an environment conducive to **constrained** devices. (weak hardware, small battery capacity, etc.)
//!
//! Requests and responses travel in UDP datagrams, so the protocol brings its own
//! reliability layer: a Confirmable message is retransmitted with exponential
//! backoff until the peer acknowledges it.
//!
//! ## What's in the box
//! - [`endpoint::Endpoint`]: the entry point. Feed it datagrams and timer ticks;
//!   it parses, de-duplicates, dispatches requests to your resources and sends the replies.
//! - [`txn`]: a fixed pool of in-flight Confirmable exchanges and their retransmission.
//! - [`observe`]: a fixed pool of Observe subscriptions and notification delivery.
//! - [`block`]: Block2 negotiation around each resource handler call.
//! - [`resource`]: the seam between the engine and your resource handlers.
//!
//! Nothing here allocates; every pool has a capacity fixed at compile time
//! and running out of room is an error the engine answers with
//! `5.03 Service Unavailable` rather than a panic.
//!
//! Message parsing & serialization lives in [`newt_msg`], re-exported as [`msg`].

#![doc(html_root_url = "https://docs.rs/newt/0.1.0")]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(missing_copy_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

#[cfg(test)]
pub(crate) mod test;

pub(crate) mod logging;

/// Runtime configuration
pub mod config;

/// customizable retrying of fallible operations
pub mod retry;

/// time
pub mod time;

/// network abstractions
pub mod net;

/// Platform types an [`endpoint::Endpoint`] is generic over
pub mod platform;

/// Transaction Manager: in-flight Confirmable exchanges
pub mod txn;

/// Observer Registry: Observe subscriptions
pub mod observe;

/// Blockwise Transfer Coordinator
pub mod block;

/// Resource handlers and the [`resource::Exchange`] they are given
pub mod resource;

/// `.well-known/core` resource discovery
pub mod discovery;

/// The protocol front-end
pub mod endpoint;

/// `std`-only platform support
#[cfg(feature = "std")]
#[cfg_attr(any(feature = "docs", docsrs), doc(cfg(feature = "std")))]
pub mod std;

#[doc(inline)]
pub use newt_msg as msg;

/// Largest datagram the engine will build or store
pub const MAX_PACKET_SIZE: usize = 1152;

/// Size of the buffer resource handlers write their response payload into
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// A fixed-size pool had no free slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExhausted;
