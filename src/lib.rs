#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod bibliography;
pub mod collection;
pub mod cv;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod page;
pub mod render;
pub mod settings;

pub use crate::error::{Error, Result};
pub use crate::models::{Align, Layout, PageConfig, Profile, Section};
pub use crate::settings::Settings;
