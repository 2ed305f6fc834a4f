//! LSP frontend for jsonlint-ls.
//!
//! - [`codec`]: `Content-Length` framing
//! - `protocol`: the messages this server sends and understands
//! - [`serve`]: one editor session, wired to the linter
//!
//! Documents map onto [`jsonlint_core::EditorEvent`]s and diagnostics flow
//! back through [`LspHost`].

pub mod codec;
mod protocol;
mod session;

pub use codec::{CodecError, FrameReader, FrameWriter};
pub use protocol::{PathToUriError, path_to_file_uri};
pub use session::{LspHost, serve};
