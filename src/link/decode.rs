//! Target-path decoders
//!
//! Relation records point at other objects through a `tDn`. These functions
//! turn such paths into the short labels that end up in the document. They
//! never fail: when no known marker applies they fall back to the last
//! segment (or the path below `uni/`).

use crate::dn::{decode_bracketed_interior, extract_after_marker, Dn};
use crate::mo::ObjectRecord;
use crate::normalize::Blank;
use serde::Serialize;

// ── Named targets ─────────────────────────────────────────────

/// Contract name of a `fvRsProv`/`fvRsCons`/`vzRsAnyTo*` relation.
///
/// `brc-` segment of the target, else `tnVzBrCPName`, else the target path
/// below `uni/`.
pub fn contract_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "brc", "tnVzBrCPName")
}

/// VRF name of a `fvRsCtx` / `l3extRsEctx` relation.
pub fn vrf_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "ctx", "tnFvCtxName")
}

/// Bridge-domain name of a `fvRsBd` / `l2extRsEBd` relation.
pub fn bd_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "BD", "tnFvBDName")
}

/// Filter name of a `vzRsSubjFiltAtt` relation.
pub fn filter_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "flt", "tnVzFilterName")
}

/// Service-graph name of a `vzRsSubjGraphAtt` relation.
pub fn graph_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "AbsGraph", "tnVnsAbsGraphName")
}

/// Redirect-policy name of a `vnsRsLIfCtxToSvcRedirectPol` relation.
pub fn redirect_policy_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "svcRedirectPol", "tnVnsSvcRedirectPolName")
}

/// Logical-device name of a `vnsRsLDevCtxToLDev` relation.
pub fn device_name(record: &ObjectRecord) -> Option<String> {
    named_target(record, "lDevVip", "tnVnsLDevVipName")
}

fn named_target(record: &ObjectRecord, marker: &str, name_attr: &str) -> Option<String> {
    if let Some(target) = record.target() {
        if let Some(name) = target.after_marker(marker) {
            return Some(name.to_string());
        }
    }
    if !name_attr.is_empty() {
        if let Some(name) = record.attr(name_attr) {
            return Some(name.to_string());
        }
    }
    record.target().map(|target| below_uni(target.as_str()).to_string())
}

/// Path with a leading `uni/` removed.
pub fn below_uni(path: &str) -> &str {
    path.strip_prefix("uni/").unwrap_or(path)
}

// ── Domains ───────────────────────────────────────────────────

/// Human label for a domain target.
///
/// - `uni/vmmp-VMware/dom-DC1` -> `VMware:DC1`
/// - `uni/phys-PHYS` -> `phys:PHYS`
/// - `uni/l2dom-L2` -> `l2dom:L2`
/// - `uni/l3dom-L3` -> `l3dom:L3`
/// - anything else -> the path below `uni/`
pub fn domain_label(target: &Dn) -> String {
    if let (Some(provider), Some(domain)) = (target.after_marker("vmmp"), target.after_marker("dom"))
    {
        return format!("{provider}:{domain}");
    }
    for marker in ["phys", "l2dom", "l3dom"] {
        if let Some(name) = target.after_marker(marker) {
            return format!("{marker}:{name}");
        }
    }
    below_uni(target.as_str()).to_string()
}

/// VMM provider and domain name, when `target` is a VMM domain.
pub fn vmm_domain(target: &Dn) -> Option<(String, String)> {
    let provider = target.after_marker("vmmp")?;
    let domain = target.after_marker("dom")?;
    Some((provider.to_string(), domain.to_string()))
}

/// VLAN pool name inside `vlanns-[...]`, else the last segment.
pub fn vlan_pool_name(target: &Dn) -> String {
    match target.segments().iter().rev().find(|s| s.marker() == "vlanns") {
        Some(segment) => decode_bracketed_interior(segment.value())
            .unwrap_or(segment.value())
            .to_string(),
        None => target
            .last_segment()
            .map(|s| s.raw().to_string())
            .unwrap_or_default(),
    }
}

// ── Path bindings ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Single,
    Vpc,
    Unknown,
}

/// A decoded static path attachment.
///
/// Field order is the sort key: kind, leafs, port, vlan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PathBinding {
    pub kind: BindingKind,
    pub leafs: Vec<String>,
    pub port: String,
    pub vlan: Option<u16>,
    /// Raw target, kept for bindings that did not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl PathBinding {
    /// Decode a path-attachment target plus its encapsulation tag.
    ///
    /// - `topology/pod-1/paths-101/pathep-[eth1/1]` -> single, `["101"]`, `eth1/1`
    /// - `topology/pod-1/protpaths-101-102/pathep-[PC-ESX]` -> vpc, `["101","102"]`, `PC-ESX`
    pub fn decode(target: &Dn, encap: Option<&str>) -> Self {
        let vlan = encap.and_then(parse_vlan);
        let port = target.after_marker("pathep");

        if let (Some(pair), Some(port)) = (target.after_marker("protpaths"), port) {
            return Self {
                kind: BindingKind::Vpc,
                leafs: pair.split('-').map(str::to_string).collect(),
                port: port.to_string(),
                vlan,
                target: None,
            };
        }
        if let (Some(leaf), Some(port)) = (target.after_marker("paths"), port) {
            return Self {
                kind: BindingKind::Single,
                leafs: vec![leaf.to_string()],
                port: port.to_string(),
                vlan,
                target: None,
            };
        }
        Self {
            kind: BindingKind::Unknown,
            leafs: Vec::new(),
            port: extract_after_marker(target.as_str(), "pathep"),
            vlan,
            target: Some(target.to_string()),
        }
    }

    pub fn from_record(record: &ObjectRecord) -> Option<Self> {
        let target = record.target()?;
        Some(Self::decode(&target, record.attr("encap")))
    }
}

impl Blank for PathBinding {
    fn is_blank(&self) -> bool {
        self.kind == BindingKind::Unknown && self.port.is_empty() && self.target.is_none()
    }
}

/// `vlan-110` -> `110`. Other encapsulations (`vxlan-`, `unknown`) yield `None`.
pub fn parse_vlan(encap: &str) -> Option<u16> {
    encap.strip_prefix("vlan-")?.parse().ok()
}

// ── Endpoint labels ───────────────────────────────────────────

/// Label of a contract endpoint from its own DN.
///
/// - EPG `.../ap-App/epg-Web` -> `App/Web`
/// - ESG `.../ap-App/esg-Sec` -> `App/Sec`
/// - external EPG `.../out-Core/instP-Ext` -> `Core/Ext`
/// - L2 external EPG `.../l2out-Legacy/instP-Ext` -> `Legacy/Ext`
/// - vzAny `.../ctx-Prod/any` -> `vzAny/Prod`
pub fn endpoint_label(dn: &Dn) -> String {
    if let Some(epg) = dn.after_marker("epg") {
        return format!("{}/{}", dn.name_after("ap"), epg);
    }
    if let Some(esg) = dn.after_marker("esg") {
        return format!("{}/{}", dn.name_after("ap"), esg);
    }
    if let Some(instp) = dn.after_marker("instP") {
        if let Some(out) = dn.after_marker("out").or_else(|| dn.after_marker("l2out")) {
            return format!("{out}/{instp}");
        }
    }
    if dn.last_segment().map(|s| s.raw()) == Some("any") {
        return format!("vzAny/{}", dn.name_after("ctx"));
    }
    below_uni(dn.as_str()).to_string()
}

// ── ESG selectors ─────────────────────────────────────────────

/// `tenant/ap/epg` for an EPG path, dropping parts that are absent.
pub fn pretty_epg(path: &Dn) -> String {
    let epg = path
        .after_marker("epg")
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string());
    [path.after_marker("tn"), path.after_marker("ap")]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .chain(std::iter::once(epg))
        .collect::<Vec<_>>()
        .join("/")
}

/// EPG selected by an ESG EPG selector.
///
/// `.../esg-E/epgselector-[uni/tn-T/ap-A/epg-W]` embeds the EPG path in
/// brackets; `matchEpgDn` carries it on EP selectors.
pub fn epg_selector(record: &ObjectRecord) -> String {
    let embedded = record
        .attr("matchEpgDn")
        .map(Dn::new)
        .or_else(|| {
            record
                .dn
                .last_segment()
                .and_then(|s| decode_bracketed_interior(s.raw()))
                .map(Dn::new)
        })
        .filter(|dn| dn.has_marker("epg"));
    match embedded {
        Some(epg) => pretty_epg(&epg),
        None => record.dn.to_string(),
    }
}

/// IP or range selected by an ESG IP selector.
pub fn ip_selector(record: &ObjectRecord) -> String {
    if let Some(ip) = record.attr_any(&["ip", "subnet", "prefix"]) {
        return ip.to_string();
    }
    if let (Some(from), Some(to)) = (record.attr("fromIp"), record.attr("toIp")) {
        return format!("{from}-{to}");
    }
    if let Some(expr) = record.attr("matchExpression").filter(|e| e.contains("ip==")) {
        return match_expression_value(expr);
    }
    record.dn.to_string()
}

fn match_expression_value(expr: &str) -> String {
    for quote in ['\'', '"'] {
        let mut parts = expr.split(quote);
        if let (Some(_), Some(inner)) = (parts.next(), parts.next()) {
            return inner.to_string();
        }
    }
    expr.replace("ip==", "")
        .trim_matches(|c| c == '\'' || c == '"' || c == ' ')
        .to_string()
}

/// `key operator value` of a tag selector, else its name, else its DN.
pub fn tag_selector(record: &ObjectRecord) -> String {
    let parts: Vec<&str> = ["key", "operator", "value"]
        .iter()
        .filter_map(|key| record.attr(key))
        .collect();
    if !parts.is_empty() {
        return parts.join(" ");
    }
    record
        .attr("name")
        .map(str::to_string)
        .unwrap_or_else(|| record.dn.to_string())
}
