//! Closed set of APIC class tags the harvesters understand
//!
//! Every record's class name is parsed once into a [`ClassTag`]. Unknown
//! classes become [`ClassTag::Other`] and are ignored by every harvester.

use std::fmt;

macro_rules! class_tags {
    ($($variant:ident => $name:literal,)*) => {
        /// APIC managed-object class.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ClassTag {
            $($variant,)*
            /// ESG IP/subnet selector variants (`fvEsgIpSelector`,
            /// `fvSubnetSelector`, ...); keeps the original class name.
            IpSelector(String),
            Other(String),
        }

        impl ClassTag {
            pub fn parse(name: &str) -> Self {
                match name {
                    $($name => Self::$variant,)*
                    other if is_ip_selector_class(other) => Self::IpSelector(other.to_string()),
                    other => Self::Other(other.to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::IpSelector(name) | Self::Other(name) => name,
                }
            }
        }
    };
}

class_tags! {
    Error => "error",
    FvTenant => "fvTenant",

    // VRFs
    FvCtx => "fvCtx",
    FvRtCtx => "fvRtCtx",
    HealthInst => "healthInst",
    VzRsAnyToProv => "vzRsAnyToProv",
    VzRsAnyToCons => "vzRsAnyToCons",

    // Bridge domains
    FvBd => "fvBD",
    FvRsCtx => "fvRsCtx",
    FvSubnet => "fvSubnet",

    // EPGs
    FvAEPg => "fvAEPg",
    FvRsBd => "fvRsBd",
    FvRsDomAtt => "fvRsDomAtt",
    FvRsPathAtt => "fvRsPathAtt",
    FvRsProv => "fvRsProv",
    FvRsCons => "fvRsCons",

    // Contracts
    VzBrCP => "vzBrCP",
    VzSubj => "vzSubj",
    VzRsSubjFiltAtt => "vzRsSubjFiltAtt",
    VzRsSubjGraphAtt => "vzRsSubjGraphAtt",

    // L3Outs
    L3extOut => "l3extOut",
    L3extRsEctx => "l3extRsEctx",
    L3extRsL3DomAtt => "l3extRsL3DomAtt",
    L3extRsNodeL3OutAtt => "l3extRsNodeL3OutAtt",
    L3extInstP => "l3extInstP",
    L3extSubnet => "l3extSubnet",
    OspfExtP => "ospfExtP",
    BgpExtP => "bgpExtP",
    EigrpExtP => "eigrpExtP",

    // L2Outs
    L2extOut => "l2extOut",
    L2extRsEBd => "l2extRsEBd",
    L2extRsL2DomAtt => "l2extRsL2DomAtt",
    L2extRsPathL2OutAtt => "l2extRsPathL2OutAtt",
    L2extInstP => "l2extInstP",

    // Service graphs
    VnsAbsGraph => "vnsAbsGraph",
    VnsAbsNode => "vnsAbsNode",
    VnsAbsFuncConn => "vnsAbsFuncConn",
    VnsAbsConnection => "vnsAbsConnection",
    VnsRsAbsConnectionConns => "vnsRsAbsConnectionConns",
    VnsLDevCtx => "vnsLDevCtx",
    VnsRsLDevCtxToLDev => "vnsRsLDevCtxToLDev",
    VnsRsLIfCtxToSvcRedirectPol => "vnsRsLIfCtxToSvcRedirectPol",
    VnsSvcRedirectPol => "vnsSvcRedirectPol",

    // Endpoint security groups
    FvESg => "fvESg",
    FvEPgSelector => "fvEPgSelector",
    FvTagSelector => "fvTagSelector",
    FvEPSelector => "fvEPSelector",
    FvAEPSelector => "fvAEPSelector",

    // VMM domains
    VmmDomP => "vmmDomP",
    VmmCtrlrP => "vmmCtrlrP",
    InfraRsVlanNs => "infraRsVlanNs",
    VmmRsVlanNs => "vmmRsVlanNs",
}

fn is_ip_selector_class(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("ipselector") || lower.ends_with("subnetselector")
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
