// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core editing types with ZERO external dependencies.
//!
//! # Modules
//!
//! - [`editing`]: Editor modes and bounded slider values
//!   ([`Brightness`](editing::Brightness), [`Contrast`](editing::Contrast),
//!   [`TextSize`](editing::TextSize), [`TextAlphaPercent`](editing::TextAlphaPercent))

pub mod editing;
