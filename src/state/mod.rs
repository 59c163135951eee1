/// State management module
///
/// This module handles all application state, including:
/// - Data shapes served by the track service (data.rs)
/// - The viewer session: selections, loaded track, scrub position (session.rs)

pub mod data;
pub mod session;
