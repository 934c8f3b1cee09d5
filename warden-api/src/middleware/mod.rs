/// Middleware modules for the API server
///
/// - `auth`: Bearer authentication, role checks and the `CurrentUser` extractor

pub mod auth;
