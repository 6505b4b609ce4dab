//! Catalog of the LoRaWAN record types the console manages, and which
//! upstream surface each operation goes through.

use crate::types::{Operation, RpcMethod};
use crate::upstream::{Enrichment, ListStrategy};

/// Which ERPNext surface serves an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Whitelisted method, parameters in the POST body
    Rpc,
    /// `/api/resource/<DocType>`
    Resource,
}

/// Field filled by an upstream post-insert hook, looked up by `lookup_key`.
#[derive(Debug, Clone, Copy)]
pub struct DerivedField {
    pub field: &'static str,
    pub lookup_key: &'static str,
}

#[derive(Debug)]
pub struct Entity {
    /// Singular noun used in messages
    pub label: &'static str,
    /// Route segment under `/api`
    pub path: &'static str,
    pub doctype: &'static str,
    /// RPC module under the configured namespace
    pub module: &'static str,
    pub list: ListStrategy,
    pub fetch: Surface,
    /// `None` for read-only entities
    pub create: Option<Surface>,
    pub writable: bool,
    pub derived: Option<DerivedField>,
    pub region_field: Option<&'static str>,
    pub event_stream: bool,
}

impl Entity {
    pub fn method(&self, namespace: &str, rpc: RpcMethod) -> String {
        format!("{}.{}.{}", namespace, self.module, rpc.suffix())
    }

    pub fn failure(&self, op: Operation) -> String {
        format!("Failed to {} {}", op.verb(), self.label)
    }

    pub fn enrichment<'a>(&self, fetch_method: &'a str) -> Option<Enrichment<'a>> {
        self.derived.map(|derived| Enrichment {
            derived_field: derived.field,
            lookup_key: derived.lookup_key,
            fetch_method,
        })
    }
}

const CHIRPSTACK_ID: DerivedField = DerivedField {
    field: "chirpstack_id",
    lookup_key: "name",
};

pub static TENANTS: Entity = Entity {
    label: "tenant",
    path: "tenants",
    doctype: "LoRaWAN Tenant",
    module: "tenant",
    list: ListStrategy::Cascade,
    fetch: Surface::Rpc,
    create: Some(Surface::Rpc),
    writable: true,
    derived: Some(CHIRPSTACK_ID),
    region_field: None,
    event_stream: false,
};

pub static APPLICATIONS: Entity = Entity {
    label: "application",
    path: "applications",
    doctype: "LoRaWAN Application",
    module: "application",
    list: ListStrategy::RpcWithFallback,
    fetch: Surface::Resource,
    create: Some(Surface::Resource),
    writable: true,
    derived: None,
    region_field: None,
    event_stream: false,
};

pub static DEVICES: Entity = Entity {
    label: "device",
    path: "devices",
    doctype: "LoRaWAN Device",
    module: "device",
    list: ListStrategy::RpcWithFallback,
    fetch: Surface::Resource,
    create: Some(Surface::Resource),
    writable: true,
    derived: None,
    region_field: None,
    event_stream: true,
};

pub static GATEWAYS: Entity = Entity {
    label: "gateway",
    path: "gateways",
    doctype: "LoRaWAN Gateway",
    module: "gateway",
    list: ListStrategy::RpcWithFallback,
    fetch: Surface::Resource,
    create: Some(Surface::Resource),
    writable: true,
    derived: None,
    region_field: None,
    event_stream: true,
};

pub static DEVICE_PROFILES: Entity = Entity {
    label: "device profile",
    path: "device-profiles",
    doctype: "LoRaWAN Device Profile",
    module: "device_profile",
    list: ListStrategy::Cascade,
    fetch: Surface::Rpc,
    create: Some(Surface::Rpc),
    writable: true,
    derived: Some(CHIRPSTACK_ID),
    region_field: Some("region"),
    event_stream: false,
};

pub static SUBSCRIPTIONS: Entity = Entity {
    label: "subscription",
    path: "subscriptions",
    doctype: "LoRaWAN Subscription",
    module: "subscription",
    list: ListStrategy::Resource,
    fetch: Surface::Resource,
    create: None,
    writable: false,
    derived: None,
    region_field: None,
    event_stream: false,
};

pub static USERS: Entity = Entity {
    label: "user",
    path: "users",
    doctype: "User",
    module: "user",
    list: ListStrategy::Cascade,
    fetch: Surface::Resource,
    create: Some(Surface::Rpc),
    writable: true,
    derived: None,
    region_field: None,
    event_stream: false,
};

pub static ALL: [&Entity; 7] = [
    &TENANTS,
    &APPLICATIONS,
    &DEVICES,
    &GATEWAYS,
    &DEVICE_PROFILES,
    &SUBSCRIPTIONS,
    &USERS,
];
