/// API route handlers
///
/// Handlers are thin: they validate the request body, call the matching
/// service operation with the authenticated caller, and shape the response.
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh, current user
/// - `projects`: Project CRUD and membership management
/// - `tasks`: Task CRUD
/// - `admin`: System-admin user management

pub mod admin;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
