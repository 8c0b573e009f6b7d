//! 1Password CLI backend.
//!
//! This backend drives the `op` command-line tool. Repository calls run one
//! subprocess each, plus a lookup before creates and before grant or item
//! ensures, and decode the JSON it prints. Nothing is cached between calls.
//!
//! # Authentication
//!
//! The tool must already be signed in. A session token passed through the
//! `session` option is exported to the subprocess as `OP_SESSION`.
//!
//! # Configuration
//!
//! - `op_path`: program to run (default: "op")
//! - `session`: session token
//!
//! # Example
//!
//! ```
//! use vaultorg::{Config, BackendType};
//! use vaultorg::backends::onepassword::OnePasswordRepository;
//!
//! let config = Config::new(BackendType::OnePassword).with_option("session", "token");
//! let repo = OnePasswordRepository::new(&config);
//! ```

mod backend;
mod command;
mod wire;

pub use backend::OnePasswordRepository;
pub use command::OpCommand;
