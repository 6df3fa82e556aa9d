//! The library code for the `tildepost` blog publisher. There are two
//! independent pipelines:
//!
//! 1. Publishing ([`crate::build`]): every text post in the input directory
//!    is converted to HTML ([`crate::markdown`]), placed into the post
//!    template ([`crate::post`]), linked from the top of the index page
//!    ([`crate::index`]) and moved into the archive.
//! 2. Duplicating ([`crate::duplicate`]): the marked block of each file in
//!    the translation inbox is repeated, the copy machine-translated
//!    ([`crate::translate`]).
//!
//! Both are strictly sequential: one file is finished before the next one is
//! opened. Locations and markers come from [`crate::config`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod duplicate;
pub mod index;
pub mod logger;
pub mod markdown;
pub mod post;
pub mod prettify;
pub mod translate;
mod util;
