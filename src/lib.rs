pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{catalog, coerce, dispatch, providers, resolver, shell, stdio, transport};
pub use domain::{incident, todo, types, weather};
pub use infrastructure::{model, server};
