//! Service graph templates (`vnsAbsGraph`)
//!
//! Nodes, connections and connectors live under the graph. Device selection
//! policies (`vnsLDevCtx`) do not: they sit directly under the tenant and
//! name their graph and node through `graphNameOrLbl` / `nodeNameOrLbl`, so
//! they are placed through the graph/node name table.

use super::Harvest;
use crate::classify::{Entity, NameTable, Registry};
use crate::dn::Dn;
use crate::link::{attach, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{normalize_all, sorted_unique, strip_volatile, Blank, Normalize};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceGraph {
    pub name: String,
    pub dn: Dn,
    pub nodes: Vec<GraphNode>,
    pub connections: Vec<Connection>,
    /// Contracts whose subjects render through this graph.
    pub contracts: Vec<String>,
    pub device_contexts: Vec<DeviceContext>,
    pub redirect_policies: Vec<String>,
}

/// Function node (`vnsAbsNode`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GraphNode {
    pub name: String,
    pub func_type: Option<String>,
    pub connectors: Vec<Connector>,
}

/// Function connector (`vnsAbsFuncConn`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Connector {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

/// Connection between connectors (`vnsAbsConnection`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Connection {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// `node/connector` labels of the joined connectors.
    pub connectors: Vec<String>,
}

/// Device selection policy (`vnsLDevCtx`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DeviceContext {
    pub contract: String,
    pub node: String,
    pub device: Option<String>,
    pub redirect_policies: Vec<String>,
}

// ── Entities ──────────────────────────────────────────────────

impl Entity for ServiceGraph {
    const CLASS: ClassTag = ClassTag::VnsAbsGraph;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("AbsGraph")),
            dn: record.dn.clone(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for GraphNode {
    const CLASS: ClassTag = ClassTag::VnsAbsNode;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("AbsNode")),
            func_type: record.attr_owned("funcType"),
            connectors: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Connection {
    const CLASS: ClassTag = ClassTag::VnsAbsConnection;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("AbsConnection")),
            attributes: strip_volatile(record.attributes.clone()),
            connectors: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for DeviceContext {
    const CLASS: ClassTag = ClassTag::VnsLDevCtx;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            contract: record.attr_owned("ctrctNameOrLbl").unwrap_or_default(),
            node: record.attr_owned("nodeNameOrLbl").unwrap_or_default(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.node
    }
}

// ── Normalization ─────────────────────────────────────────────

impl Blank for GraphNode {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Blank for Connector {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Blank for Connection {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Blank for DeviceContext {
    fn is_blank(&self) -> bool {
        self.contract.is_blank() && self.node.is_blank() && self.device.is_none()
    }
}

impl Normalize for GraphNode {
    fn normalize(mut self) -> Self {
        self.connectors = sorted_unique(self.connectors);
        self
    }
}

impl Normalize for Connection {
    fn normalize(mut self) -> Self {
        self.connectors = sorted_unique(self.connectors);
        self
    }
}

impl Normalize for DeviceContext {
    fn normalize(mut self) -> Self {
        self.redirect_policies = sorted_unique(self.redirect_policies);
        self
    }
}

impl Normalize for ServiceGraph {
    fn normalize(mut self) -> Self {
        self.nodes = normalize_all(self.nodes);
        self.connections = normalize_all(self.connections);
        self.contracts = sorted_unique(self.contracts);
        self.device_contexts = normalize_all(self.device_contexts);
        let reachable: Vec<String> = self
            .device_contexts
            .iter()
            .flat_map(|ctx| ctx.redirect_policies.clone())
            .collect();
        self.redirect_policies.extend(reachable);
        self.redirect_policies = sorted_unique(self.redirect_policies);
        self
    }
}

// ── Decoders ──────────────────────────────────────────────────

fn connector(record: &ObjectRecord) -> Option<Connector> {
    Some(Connector {
        name: record
            .attr_owned("name")
            .unwrap_or_else(|| record.dn.name_after("AbsFConn")),
        attributes: strip_volatile(record.attributes.clone()),
    })
}

/// `AbsNode-FW/AbsFConn-consumer` -> `FW/consumer`; terminal nodes keep the
/// raw connector RN (`T1/AbsTConn`).
fn connector_label(record: &ObjectRecord) -> Option<String> {
    let target = record.target()?;
    let owner = ["AbsNode", "AbsTermNodeCon", "AbsTermNodeProv"]
        .iter()
        .find_map(|marker| target.after_marker(marker));
    let connector = target
        .after_marker("AbsFConn")
        .map(str::to_string)
        .or_else(|| target.last_segment().map(|s| s.raw().to_string()))?;
    Some(match owner {
        Some(owner) => format!("{owner}/{connector}"),
        None => connector,
    })
}

/// Name-table keys for a device context: `graph/node`, then `graph`.
fn graph_keys(record: &ObjectRecord) -> Vec<String> {
    let graph = record.attr("graphNameOrLbl");
    let node = record.attr("nodeNameOrLbl");
    let mut keys = Vec::new();
    if let (Some(graph), Some(node)) = (graph, node) {
        keys.push(format!("{graph}/{node}"));
    }
    if let Some(graph) = graph {
        keys.push(graph.to_string());
    }
    keys
}

fn graph_node_table(graphs: &Registry<ServiceGraph>, nodes: &Registry<GraphNode>) -> NameTable {
    let mut table = NameTable::new();
    for (dn, graph) in graphs.iter() {
        table.insert(graph.name.clone(), dn.clone());
    }
    for (dn, node) in nodes.iter() {
        if let Some(graph) = graphs.owner_of(dn).and_then(|key| graphs.get(&key)) {
            table.insert(format!("{}/{}", graph.name, node.name), dn.clone());
        }
    }
    table
}

// ── Harvest ───────────────────────────────────────────────────

pub fn harvest(records: &[ObjectRecord]) -> Harvest<ServiceGraph> {
    let mut graphs = Registry::<ServiceGraph>::classify(records);
    let mut nodes = Registry::<GraphNode>::classify(records);
    let mut connections = Registry::<Connection>::classify(records);
    let mut contexts = Registry::<DeviceContext>::classify(records);
    let mut linker = Linker::new(records);

    let connectors = linker.bind(
        &nodes,
        class(ClassTag::VnsAbsFuncConn),
        Resolve::Parent,
        connector,
    );
    attach(&mut nodes, connectors, |node, conn| node.connectors.push(conn));

    let joins = linker.bind(
        &connections,
        class(ClassTag::VnsRsAbsConnectionConns),
        Resolve::Parent,
        connector_label,
    );
    attach(&mut connections, joins, |conn, label| conn.connectors.push(label));

    let devices = linker.bind(
        &contexts,
        class(ClassTag::VnsRsLDevCtxToLDev),
        Resolve::Parent,
        decode::device_name,
    );
    // Redirect policies hang off the context's logical interface contexts.
    let redirects = linker.bind(
        &contexts,
        class(ClassTag::VnsRsLIfCtxToSvcRedirectPol),
        Resolve::Parent,
        decode::redirect_policy_name,
    );
    attach(&mut contexts, devices, |ctx, device| ctx.device = Some(device));
    attach(&mut contexts, redirects, |ctx, name| ctx.redirect_policies.push(name));

    let table = graph_node_table(&graphs, &nodes);
    let placed = linker.bind(
        &graphs,
        class(ClassTag::VnsLDevCtx),
        Resolve::Named {
            table: &table,
            keys: graph_keys,
        },
        |r| contexts.get_by_dn(&r.dn).cloned(),
    );
    let contracts = linker.bind(
        &graphs,
        class(ClassTag::VzRsSubjGraphAtt),
        Resolve::Target {
            name_attr: "tnVnsAbsGraphName",
        },
        |r| r.dn.after_marker("brc").map(str::to_string),
    );
    let own_redirects = linker.bind(
        &graphs,
        |r| r.class == ClassTag::VnsSvcRedirectPol && r.dn.has_marker("AbsGraph"),
        Resolve::Parent,
        |r| {
            Some(
                r.attr_owned("name")
                    .unwrap_or_else(|| r.dn.name_after("svcRedirectPol")),
            )
        },
    );
    let nested_nodes = linker.nest(&graphs, nodes);
    let nested_connections = linker.nest(&graphs, connections);

    attach(&mut graphs, placed, |graph, ctx| graph.device_contexts.push(ctx));
    attach(&mut graphs, contracts, |graph, name| graph.contracts.push(name));
    attach(&mut graphs, own_redirects, |graph, name| graph.redirect_policies.push(name));
    attach(&mut graphs, nested_nodes, |graph, node| graph.nodes.push(node));
    attach(&mut graphs, nested_connections, |graph, conn| graph.connections.push(conn));

    let items = graphs
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect();
    Harvest::new(items, linker.finish())
}
