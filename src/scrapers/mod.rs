//! HTML extraction for profile and episode pages.
//!
//! Extraction is pure: every function takes an already parsed
//! [`scraper::Html`] document and never touches the network.
//!
//! # Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`selectors`] | Ordered fallback chains of selector strategies |
//! | [`profile`] | Show name, host, description, rating, category |
//! | [`episodes`] | Episode link discovery and episode descriptions |

pub mod episodes;
pub mod profile;
pub mod selectors;
