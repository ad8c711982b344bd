//! URL handling module for Catalog-Harvester
//!
//! This module turns the hrefs found on catalog pages into frontier keys and
//! turns link text into safe path components.
//!
//! URL identity is deliberately shallow: a host-relative href becomes absolute
//! by prefixing the configured host, a relative pagination href is appended to
//! the directory of the page it appeared on, and nothing else is rewritten.

mod normalize;
mod sanitize;

pub use normalize::{absolutize, is_absolute, is_host_relative, path_label, resolve_in_directory};
pub use sanitize::{sanitize_name, MAX_NAME_CHARS};
