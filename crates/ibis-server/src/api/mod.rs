// ABOUTME: API module containing all HTTP handler functions for the ibis API.
// ABOUTME: Organized into sub-modules for chat streaming and feedback collection.

pub mod chat;
pub mod feedback;
