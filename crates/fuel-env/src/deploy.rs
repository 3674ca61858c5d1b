//! Environment deployment workflow.
//!
//! Creates the cluster described by the settings, configures attributes and
//! networks, assigns the discovered nodes by MAC and starts the deployment.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use nailgun_core::{Error, HttpApi};

use crate::nailgun::{NailgunClient, set_pointer};
use crate::settings::{NodeSettings, Settings};

/// Networks every configured node must carry on some interface.
pub const SUPPORTED_NETWORKS: [&str; 4] = ["private", "public", "storage", "management"];

/// Admin network added to `eth0` alongside its configured networks.
const ADMIN_NETWORK: &str = "fuelweb_admin";

const ADMIN_INTERFACE: &str = "eth0";

/// What a finished run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub cluster_id: u64,
    pub nodes: usize,
    /// Id of the deployment task, when Nailgun returned one.
    pub task_id: Option<u64>,
}

/// Work collected per configured node before anything is sent.
#[derive(Debug, Default)]
struct NodePlan {
    roles: Vec<Value>,
    interfaces: BTreeMap<u64, Value>,
    disks: BTreeMap<u64, Value>,
}

/// Run the whole workflow against Nailgun.
#[instrument(skip_all, fields(env = %settings.env_name))]
pub async fn run<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    settings: &Settings,
) -> Result<Deployment> {
    let cluster_id = create_cluster(nailgun, settings).await?;
    configure_attributes(nailgun, cluster_id, settings).await?;
    let networks = configure_networks(nailgun, cluster_id, settings).await?;

    let discovered = nodes_by_mac(nailgun.list_nodes().await?)?;
    let plan = plan_nodes(nailgun, &settings.nodes, &discovered, &networks).await?;

    info!(count = plan.roles.len(), "Assigning nodes");
    nailgun
        .add_nodes(cluster_id, Value::Array(plan.roles))
        .await?;

    for (node_id, disks) in plan.disks {
        debug!(node_id, "Updating volumes");
        nailgun.put_node_disks(node_id, disks).await?;
    }

    rename_nodes(nailgun, &settings.nodes).await?;

    for (node_id, interfaces) in plan.interfaces {
        debug!(node_id, "Updating interfaces");
        nailgun.put_node_interfaces(node_id, interfaces).await?;
    }

    info!(cluster_id, "Deploying changes");
    let task = nailgun.deploy_cluster_changes(cluster_id).await?;

    Ok(Deployment {
        cluster_id,
        nodes: settings.nodes.len(),
        task_id: task["id"].as_u64(),
    })
}

async fn create_cluster<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    settings: &Settings,
) -> Result<u64> {
    let data = json!({
        "name": settings.env_name,
        "release_id": settings.release_id,
        "net_provider": "neutron",
        "net_segment_type": "vlan",
    });

    let cluster = match nailgun.create_cluster(data).await {
        Ok(cluster) => cluster,
        Err(Error::Http(e)) => {
            let message = e.message.clone().unwrap_or_else(|| e.to_string());
            bail!(message);
        }
        Err(e) => return Err(e).context("Failed to create cluster"),
    };

    let id = cluster["id"]
        .as_u64()
        .context("Created cluster has no id")?;
    info!(cluster_id = id, "Cluster created");
    Ok(id)
}

/// Enable the UI plugin and KVM, assign public networks to all nodes and set repos.
async fn configure_attributes<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    cluster_id: u64,
    settings: &Settings,
) -> Result<()> {
    let mut attributes = nailgun.get_cluster_attributes(cluster_id).await?;

    let changes = [
        ("/editable/gamma-lcp-ui/metadata/enabled", json!(true)),
        ("/editable/common/libvirt_type/value", json!("kvm")),
        (
            "/editable/public_network_assignment/assign_to_all_nodes/value",
            json!(true),
        ),
        ("/editable/repo_setup/repos/value", settings.repos.clone()),
    ];
    for (pointer, value) in changes {
        set_pointer(&mut attributes, pointer, value)
            .with_context(|| format!("Cluster attributes lack {}", pointer))?;
    }

    nailgun
        .update_cluster_attributes(cluster_id, attributes)
        .await?;
    Ok(())
}

/// Merge the public network settings and floating ranges. Returns the
/// configuration as sent.
async fn configure_networks<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    cluster_id: u64,
    settings: &Settings,
) -> Result<Value> {
    let mut networks = nailgun.get_networks(cluster_id).await?;

    let public = networks["networks"]
        .as_array_mut()
        .and_then(|all| all.iter_mut().find(|n| n["name"] == "public"))
        .and_then(Value::as_object_mut)
        .context("Cluster has no public network")?;
    for (key, value) in &settings.networks.public_network {
        public.insert(key.clone(), value.clone());
    }

    set_pointer(
        &mut networks,
        "/networking_parameters/floating_ranges",
        settings.networks.floating_ranges.clone(),
    )
    .context("Network configuration lacks networking parameters")?;

    nailgun
        .update_networks(cluster_id, networks.clone())
        .await?;
    Ok(networks)
}

fn nodes_by_mac(nodes: Value) -> Result<BTreeMap<String, Value>> {
    let Value::Array(nodes) = nodes else {
        bail!("Node list is not an array");
    };
    Ok(nodes
        .into_iter()
        .filter_map(|node| {
            let mac = node["mac"].as_str()?.to_string();
            Some((mac, node))
        })
        .collect())
}

fn node_id(node: &Value) -> Result<u64> {
    node["id"].as_u64().context("Node has no id")
}

async fn plan_nodes<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    configured: &[NodeSettings],
    discovered: &BTreeMap<String, Value>,
    networks: &Value,
) -> Result<NodePlan> {
    let mut plan = NodePlan::default();

    for node in configured {
        let Some(found) = discovered.get(&node.mac) else {
            bail!("Node with MAC {} is not available", node.mac);
        };
        let id = node_id(found)?;
        plan.roles.push(json!({"id": id, "roles": node.roles}));

        if let Some(assigned) = &node.interfaces {
            let mut interfaces = nailgun.get_node_interfaces(id).await?;
            let slots = interfaces
                .as_array_mut()
                .context("Node interfaces are not an array")?;
            update_interfaces(slots, assigned, networks)?;
            plan.interfaces.insert(id, interfaces);
        }

        if let Some(volumes) = &node.disks {
            let disks = match nailgun.get_node_disks(id).await? {
                Value::Array(disks) => disks,
                _ => bail!("Node disks are not an array"),
            };
            plan.disks
                .insert(id, Value::Array(update_disks(disks, volumes)));
        }
    }

    Ok(plan)
}

/// Apply configured names to the discovered nodes and send the full list back.
async fn rename_nodes<C: HttpApi>(
    nailgun: &mut NailgunClient<C>,
    configured: &[NodeSettings],
) -> Result<()> {
    let mut nodes = nodes_by_mac(nailgun.list_nodes().await?)?;
    for node in configured {
        if let (Some(name), Some(found)) = (&node.name, nodes.get_mut(&node.mac)) {
            found["name"] = json!(name);
        }
    }
    nailgun
        .update_nodes(Value::Array(nodes.into_values().collect()))
        .await?;
    Ok(())
}

/// Assign networks to the named interfaces. Every network in
/// [`SUPPORTED_NETWORKS`] must be assigned somewhere; `eth0` also keeps the
/// admin network. Interfaces not named in `assigned` are left untouched.
pub fn update_interfaces(
    interfaces: &mut [Value],
    assigned: &BTreeMap<String, Vec<String>>,
    networks: &Value,
) -> Result<()> {
    let used: BTreeSet<&str> = assigned.values().flatten().map(String::as_str).collect();
    let missing: Vec<&str> = SUPPORTED_NETWORKS
        .iter()
        .copied()
        .filter(|name| !used.contains(name))
        .collect();
    if !missing.is_empty() {
        bail!("Networks {:?} should be assigned.", missing);
    }

    let by_name: BTreeMap<&str, Value> = networks["networks"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|n| {
            let name = n["name"].as_str()?;
            Some((name, json!({"id": n["id"], "name": name})))
        })
        .collect();
    let lookup = |name: &str| {
        by_name
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown network `{}`", name))
    };

    for interface in interfaces.iter_mut() {
        let Some(name) = interface["name"].as_str().map(str::to_string) else {
            continue;
        };
        let Some(wanted) = assigned.get(&name) else {
            continue;
        };

        let mut assigned_networks = wanted
            .iter()
            .map(|n| lookup(n.as_str()))
            .collect::<Result<Vec<_>>>()?;
        if name == ADMIN_INTERFACE {
            assigned_networks.push(lookup(ADMIN_NETWORK)?);
        }
        interface["assigned_networks"] = Value::Array(assigned_networks);
    }
    Ok(())
}

/// Replace the volumes of every disk named in `volumes`. Other disks are kept
/// as they are; configured disks the node lacks are ignored.
pub fn update_disks(
    mut disks: Vec<Value>,
    volumes: &BTreeMap<String, BTreeMap<String, u64>>,
) -> Vec<Value> {
    for disk in disks.iter_mut() {
        let Some(sizes) = disk["name"].as_str().and_then(|name| volumes.get(name)) else {
            continue;
        };
        disk["volumes"] = sizes
            .iter()
            .map(|(name, size)| json!({"name": name, "size": size}))
            .collect();
    }
    disks
}
