//! Reusable HTML components for standalone output
//!
//! The rendered document is normally handed to a host page. These components
//! cover the case where the CLI produces the whole page itself.

pub mod layout;
