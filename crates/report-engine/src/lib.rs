//! Marktrack Report Engine
//!
//! Renders the displacement series of a finished run into a PNG line plot:
//!
//! ```text
//!  sep │ ●──●
//!      │─ ─ ─╲─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─  initial
//!      │      ●──●      ▲
//!      │           ╲    │ net
//!      │─ ─ ─ ─ ─ ─ ●─ ─▼─ ─ ─ ─ ─  final
//!      └──────────────────────────── time (s)
//! ```
//!
//! Labels use the bundled DejaVu Sans font unless another TrueType font is
//! configured.

pub mod plot;

pub use plot::*;
