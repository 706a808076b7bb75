pub mod api;
pub mod server;

pub use server::{AppState, build_router, run, serve};
