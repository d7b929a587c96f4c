//! Shared types: the form snapshot, placeholder templates, HTML helpers and
//! the error taxonomy.
//!
//! ```rust
//! use formpost::core::template::render;
//! use formpost::FormSnapshot;
//!
//! let data = FormSnapshot::new().with("name", "Ada");
//! assert_eq!(render("Hello %name%", &data), "Hello Ada");
//! ```

pub use formpost_core::*;
