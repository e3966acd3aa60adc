/// Authenticated identity of the caller.
///
/// Handlers resolve it from the bearer token and hand it to every service
/// call as `Option<&Principal>`; `None` means an anonymous request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
}
