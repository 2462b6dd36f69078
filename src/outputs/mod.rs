//! Output generation for the site's JSON snapshots.
//!
//! # Submodules
//!
//! - [`json`]: Serializes a snapshot and swaps it into place
//!
//! # Output Structure
//!
//! ```text
//! docs/
//! ├── shorts.json            # `shorts` subcommand
//! └── youtube_channels.json  # `channels` subcommand
//! ```

pub mod json;
