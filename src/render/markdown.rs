//! Markdown report
//!
//! One `index.md` with a row per tenant plus one `tenants/<name>.md` per
//! tenant. Templates are compiled into the binary; nothing is HTML-escaped.

use crate::document::{FabricDocument, TenantDocument};
use crate::error::{HarvestError, Result};
use crate::harvest::Section;
use handlebars::Handlebars;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

const INDEX_TEMPLATE: &str = include_str!("templates/index.md.hbs");
const TENANT_TEMPLATE: &str = include_str!("templates/tenant.md.hbs");

pub struct MarkdownRenderer {
    handlebars: Handlebars<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        // Register helpers
        handlebars.register_helper("join", Box::new(join_helper));
        handlebars.register_helper("dash", Box::new(dash_helper));
        handlebars.register_helper("path", Box::new(path_helper));

        handlebars
            .register_template_string("index", INDEX_TEMPLATE)
            .map_err(|e| HarvestError::Render(e.to_string()))?;
        handlebars
            .register_template_string("tenant", TENANT_TEMPLATE)
            .map_err(|e| HarvestError::Render(e.to_string()))?;

        Ok(Self { handlebars })
    }

    pub fn render_index(&self, document: &FabricDocument) -> Result<String> {
        let tenants: Vec<Value> = document
            .tenants
            .iter()
            .map(|tenant| {
                let counts: Map<String, Value> = Section::ALL
                    .into_iter()
                    .map(|section| (section.as_str().to_string(), json!(tenant.count(section))))
                    .collect();
                let failed: Vec<&String> = tenant.diagnostics.failed_sections.keys().collect();
                json!({
                    "name": tenant.name,
                    "file": tenant_file_name(&tenant.name),
                    "counts": counts,
                    "failed": failed,
                })
            })
            .collect();

        let data = json!({
            "interrupted": document.interrupted,
            "tenants": tenants,
        });
        self.render("index", &data)
    }

    pub fn render_tenant(&self, tenant: &TenantDocument) -> Result<String> {
        let sections: Map<String, Value> = Section::ALL
            .into_iter()
            .map(|section| {
                let harvested = tenant.count(section).is_some();
                (section.as_str().to_string(), Value::Bool(harvested))
            })
            .collect();
        let failed: Vec<Value> = tenant
            .diagnostics
            .failed_sections
            .iter()
            .map(|(section, error)| json!({"section": section, "error": error}))
            .chain(tenant.diagnostics.failed_domains.iter().map(|(domain, error)| {
                json!({"section": format!("vmm {domain}"), "error": error})
            }))
            .collect();
        let unresolved: Vec<Value> = tenant
            .diagnostics
            .unresolved
            .iter()
            .flat_map(|(section, report)| {
                report.counts().iter().map(move |(class, count)| {
                    json!({"section": section, "class": class, "count": count})
                })
            })
            .collect();

        let data = json!({
            "tenant": tenant,
            "sections": sections,
            "failed": failed,
            "unresolved": unresolved,
        });
        self.render("tenant", &data)
    }

    /// Write `index.md` and `tenants/<name>.md` under `out_dir`.
    pub fn write(&self, document: &FabricDocument, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let tenant_dir = out_dir.join("tenants");
        std::fs::create_dir_all(&tenant_dir)?;

        let mut written = Vec::with_capacity(document.tenants.len() + 1);
        let index = out_dir.join("index.md");
        std::fs::write(&index, self.render_index(document)?)?;
        written.push(index);

        for tenant in &document.tenants {
            let path = tenant_dir.join(tenant_file_name(&tenant.name));
            std::fs::write(&path, self.render_tenant(tenant)?)?;
            written.push(path);
        }

        tracing::info!(
            out_dir = %out_dir.display(),
            files = written.len(),
            "Wrote Markdown report"
        );
        Ok(written)
    }

    fn render(&self, template: &str, data: &Value) -> Result<String> {
        self.handlebars
            .render(template, data)
            .map_err(|e| HarvestError::Render(format!("{template}: {e}")))
    }
}

/// `<name>.md`, with anything outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn tenant_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.md")
}

// Handlebars helpers

fn join_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let items: Vec<String> = h
        .param(0)
        .and_then(|v| v.value().as_array())
        .map(|items| items.iter().map(plain_text).collect())
        .unwrap_or_default();
    if items.is_empty() {
        out.write("-")?;
    } else {
        out.write(&items.join(", "))?;
    }
    Ok(())
}

fn dash_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let text = h.param(0).map(|v| plain_text(v.value())).unwrap_or_default();
    out.write(if text.is_empty() { "-" } else { text.as_str() })?;
    Ok(())
}

/// `vpc 101-102 PC-ESX vlan-110`; unknown bindings print their raw target.
fn path_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let Some(binding) = h.param(0).map(|v| v.value()) else {
        return Ok(());
    };
    let kind = binding["kind"].as_str().unwrap_or("unknown");
    let mut text = if kind == "unknown" {
        plain_text(&binding["target"])
    } else {
        let leafs: Vec<String> = binding["leafs"]
            .as_array()
            .map(|leafs| leafs.iter().map(plain_text).collect())
            .unwrap_or_default();
        format!("{kind} {} {}", leafs.join("-"), plain_text(&binding["port"]))
    };
    if let Some(vlan) = binding["vlan"].as_u64() {
        text.push_str(&format!(" vlan-{vlan}"));
    }
    out.write(text.trim())?;
    Ok(())
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dn::Dn;
    use crate::harvest::bds::{BridgeDomain, Subnet};
    use crate::harvest::epgs::Epg;
    use crate::harvest::tenants::Tenant;
    use crate::link::{BindingKind, PathBinding};

    fn tenant_document() -> TenantDocument {
        let tenant = Tenant {
            name: "Prod".to_string(),
            dn: Dn::new("uni/tn-Prod"),
            descr: Some("production".to_string()),
        };
        let mut entry = TenantDocument::new(&tenant);
        entry.bds = Some(vec![BridgeDomain {
            name: "Web".to_string(),
            vrf: Some("Main".to_string()),
            subnets: vec![Subnet {
                ip: "10.0.0.1/24".to_string(),
                scope: Some("public".to_string()),
            }],
            ..BridgeDomain::default()
        }]);
        entry.epgs = Some(vec![Epg {
            name: "Web".to_string(),
            ap: "App".to_string(),
            bd: Some("Web".to_string()),
            static_paths: vec![PathBinding {
                kind: BindingKind::Vpc,
                leafs: vec!["101".to_string(), "102".to_string()],
                port: "PC-ESX".to_string(),
                vlan: Some(110),
                target: None,
            }],
            ..Epg::default()
        }]);
        entry.record_failure(Section::Vmm, &HarvestError::Controller("denied".into()));
        entry
    }

    #[test]
    fn test_tenant_page() {
        let renderer = MarkdownRenderer::new().unwrap();
        let page = renderer.render_tenant(&tenant_document()).unwrap();

        assert!(page.starts_with("# Tenant Prod"));
        assert!(page.contains("`uni/tn-Prod`: production"));
        assert!(page.contains("| Web | Main | - | - | 10.0.0.1/24 (public) |"));
        assert!(page.contains("vpc 101-102 PC-ESX vlan-110"));
        assert!(page.contains("| vmm | controller error: denied |"));
        assert!(!page.contains("## VRFs"));
        assert!(!page.contains("## VMM domains"));
    }

    #[test]
    fn test_failed_vmm_domain_listed() {
        let mut entry = tenant_document();
        entry.record_domain_failure(
            &Dn::new("uni/vmmp-VMware/dom-DC2"),
            &HarvestError::Controller("403: forbidden".into()),
        );
        let renderer = MarkdownRenderer::new().unwrap();
        let page = renderer.render_tenant(&entry).unwrap();

        assert!(page.contains(
            "| vmm uni/vmmp-VMware/dom-DC2 | controller error: 403: forbidden |"
        ));
    }

    #[test]
    fn test_index_and_files() {
        let document = FabricDocument {
            tenants: vec![tenant_document()],
            interrupted: true,
        };
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownRenderer::new().unwrap();

        let written = renderer.write(&document, dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("tenants").join("Prod.md").exists());

        let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("The harvest was interrupted"));
        assert!(index.contains("| [Prod](tenants/Prod.md) | - | 1 | 1 |"));
        assert!(index.contains("| vmm |"));
    }

    #[test]
    fn test_tenant_file_name() {
        assert_eq!(tenant_file_name("Prod_1"), "Prod_1.md");
        assert_eq!(tenant_file_name("a/b:c"), "a_b_c.md");
    }
}
