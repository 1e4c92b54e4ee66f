//! Common structs and abstractions used by `newt`

#![doc(html_root_url = "https://docs.rs/newt-common/0.1.0")]
#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![allow(clippy::unused_unit)]
#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

/// Cursor
pub mod cursor;
pub use cursor::*;

/// Writer
pub mod writer;
pub use writer::*;

/// Writable
pub mod writable;
pub use writable::*;
