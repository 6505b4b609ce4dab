/// Shared types used across the codebase

/// Logical operations a route performs against the ERP. Used to phrase
/// fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn verb(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Whitelisted RPC methods an entity module exposes. Updates and deletes
/// always go through the resource API and have no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    List,
    Get,
    Create,
    StreamEvents,
}

impl RpcMethod {
    /// Last segment of the dotted name, e.g. `lorawan.api.tenant.get`
    pub fn suffix(self) -> &'static str {
        match self {
            RpcMethod::List => "list",
            RpcMethod::Get => "get",
            RpcMethod::Create => "create",
            RpcMethod::StreamEvents => "stream_events",
        }
    }
}
