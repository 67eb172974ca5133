use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{
    NameReference, Reference, ReservedIpReference, StatusReason, name_of, reference_id,
    resource_group, status_reasons, timestamp,
};

#[derive(Debug, Clone, Deserialize)]
pub struct BareMetalServer {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub status_reasons: Vec<StatusReason>,
    pub profile: Option<NameReference>,
    pub zone: Option<NameReference>,
    pub vpc: Option<Reference>,
    pub memory: Option<i64>,
    pub bandwidth: Option<i64>,
    pub cpu: Option<ServerCpu>,
    pub primary_network_interface: Option<ServerNetworkInterface>,
    #[serde(default)]
    pub network_interfaces: Vec<ServerNetworkInterface>,
    pub boot_target: Option<Reference>,
    #[serde(default)]
    pub disks: Vec<ServerDisk>,
    #[serde(default)]
    pub enable_secure_boot: bool,
    pub trusted_platform_module: Option<TrustedPlatformModule>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCpu {
    pub architecture: Option<String>,
    pub core_count: Option<i64>,
    pub socket_count: Option<i64>,
    pub threads_per_core: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerNetworkInterface {
    pub id: String,
    pub name: Option<String>,
    pub subnet: Option<Reference>,
    pub primary_ip: Option<ReservedIpReference>,
    pub port_speed: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDisk {
    pub id: String,
    pub name: Option<String>,
    pub size: Option<i64>,
    pub interface_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrustedPlatformModule {
    pub mode: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// Provisioning inputs recorded when the server was created
#[derive(Debug, Clone, Deserialize)]
pub struct BareMetalServerInitialization {
    pub image: Option<Reference>,
    #[serde(default)]
    pub keys: Vec<Reference>,
    #[serde(default)]
    pub user_accounts: Vec<UserAccount>,
}

/// Account created on the server, selected by `resource_type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum UserAccount {
    HostUserAccount {
        username: String,
        encrypted_password: Option<String>,
        encryption_key: Option<Reference>,
    },
    #[serde(other)]
    Unknown,
}

impl Lifecycle for BareMetalServer {
    fn lifecycle_status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl ServerNetworkInterface {
    fn block(&self) -> HashMap<String, Value> {
        Attributes::new()
            .string("id", &self.id)
            .opt_string("name", self.name.clone())
            .opt_string("subnet", reference_id(&self.subnet))
            .opt_string(
                "primary_ip",
                self.primary_ip.as_ref().map(|ip| ip.address.clone()),
            )
            .opt_int("port_speed", self.port_speed)
            .build()
    }
}

impl Flatten for BareMetalServer {
    fn flatten(&self) -> HashMap<String, Value> {
        let cpu = self.cpu.as_ref().map(|cpu| {
            Attributes::new()
                .opt_string("architecture", cpu.architecture.clone())
                .opt_int("core_count", cpu.core_count)
                .opt_int("socket_count", cpu.socket_count)
                .opt_int("threads_per_core", cpu.threads_per_core)
                .build()
        });
        let disks = self.disks.iter().map(|d| {
            Attributes::new()
                .string("id", &d.id)
                .opt_string("name", d.name.clone())
                .opt_int("size", d.size)
                .opt_string("interface_type", d.interface_type.clone())
                .build()
        });

        let mut attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("status", self.status.clone())
            .list("status_reasons", status_reasons(&self.status_reasons))
            .opt_string("profile", name_of(&self.profile))
            .opt_string("zone", name_of(&self.zone))
            .opt_string("vpc", reference_id(&self.vpc))
            .opt_int("memory", self.memory)
            .opt_int("bandwidth", self.bandwidth)
            .nested("cpu", cpu)
            .list("disks", disks)
            .list(
                "network_interfaces",
                self.network_interfaces.iter().map(ServerNetworkInterface::block),
            )
            .opt_string("boot_target", reference_id(&self.boot_target))
            .bool("enable_secure_boot", self.enable_secure_boot)
            .opt_string(
                "trusted_platform_module",
                self.trusted_platform_module.as_ref().and_then(|t| t.mode.clone()),
            )
            .opt_string("created_at", timestamp(&self.created_at));

        if let Some(nic) = &self.primary_network_interface {
            attrs = attrs
                .nested("primary_network_interface", Some(nic.block()))
                .opt_string("primary_subnet", reference_id(&nic.subnet))
                .opt_string(
                    "primary_ip",
                    nic.primary_ip.as_ref().map(|ip| ip.address.clone()),
                );
        }
        resource_group(attrs, &self.resource_group).build()
    }
}

impl Flatten for BareMetalServerInitialization {
    fn flatten(&self) -> HashMap<String, Value> {
        let accounts = self.user_accounts.iter().filter_map(|account| match account {
            UserAccount::HostUserAccount {
                username,
                encrypted_password,
                encryption_key,
            } => Some(
                Attributes::new()
                    .string("username", username)
                    .opt_string("encrypted_password", encrypted_password.clone())
                    .opt_string(
                        "encryption_key",
                        encryption_key.as_ref().and_then(|k| k.crn.clone()),
                    )
                    .build(),
            ),
            UserAccount::Unknown => None,
        });

        Attributes::new()
            .opt_string("image", reference_id(&self.image))
            .strings("keys", self.keys.iter().map(|k| k.id.clone()))
            .list("user_accounts", accounts)
            .build()
    }
}

#[cfg(test)]
pub(crate) fn server_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "0717-bms",
        "name": "metal-1",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::bare-metal-server:0717-bms",
        "status": status,
        "status_reasons": [],
        "profile": {"name": "bx2-metal-96x384"},
        "zone": {"name": "us-south-1"},
        "vpc": {"id": "r006-vpc", "name": "main"},
        "memory": 384,
        "bandwidth": 20000,
        "cpu": {"architecture": "amd64", "core_count": 48, "socket_count": 2, "threads_per_core": 2},
        "primary_network_interface": {
            "id": "0717-nic",
            "name": "eth0",
            "subnet": {"id": "r006-subnet", "name": "web"},
            "primary_ip": {"address": "10.240.0.5"},
            "port_speed": 100000
        },
        "network_interfaces": [{"id": "0717-nic", "name": "eth0"}],
        "boot_target": {"id": "0717-disk", "name": "boot", "resource_type": "bare_metal_server_disk"},
        "disks": [{"id": "0717-disk", "name": "boot", "size": 960, "interface_type": "sata"}],
        "enable_secure_boot": false,
        "trusted_platform_module": {"mode": "disabled", "enabled": false},
        "resource_group": {"id": "rg-1"}
    })
}

#[cfg(test)]
pub(crate) fn initialization_json() -> serde_json::Value {
    serde_json::json!({
        "image": {"id": "r006-image", "name": "ubuntu-22-04"},
        "keys": [{"id": "r006-key", "name": "deploy"}],
        "user_accounts": [
            {"resource_type": "host_user_account", "username": "root",
             "encrypted_password": "qwleg==", "encryption_key": {"id": "r006-key", "crn": "crn:v1:key"}}
        ]
    })
}
