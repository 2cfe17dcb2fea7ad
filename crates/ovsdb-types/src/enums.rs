//! Enumerations with a fixed wire string in the Open_vSwitch schema.

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Parses the wire string.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Returns the wire string.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| ModelError::UnknownVariant {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

wire_enum! {
    /// OpenFlow protocol version enabled on a bridge.
    OvsdbProtocol, "protocol" {
        OpenFlow10 => "OpenFlow10",
        OpenFlow11 => "OpenFlow11",
        OpenFlow12 => "OpenFlow12",
        OpenFlow13 => "OpenFlow13",
        OpenFlow14 => "OpenFlow14",
        OpenFlow15 => "OpenFlow15",
    }
}

wire_enum! {
    /// Bridge behavior when no controller is reachable.
    FailMode, "fail mode" {
        Standalone => "standalone",
        Secure => "secure",
    }
}

wire_enum! {
    /// Bridge datapath implementation.
    DatapathType, "datapath type" {
        System => "system",
        Netdev => "netdev",
    }
}

wire_enum! {
    /// Interface `type` column values.
    InterfaceType, "interface type" {
        Internal => "internal",
        Vxlan => "vxlan",
        VxlanGpe => "vxlan-gpe",
        Patch => "patch",
        System => "system",
        Tap => "tap",
        Geneve => "geneve",
        Gre => "gre",
        IpsecGre => "ipsec_gre",
        Gre64 => "gre64",
        IpsecGre64 => "ipsec_gre64",
        Lisp => "lisp",
        Dpdk => "dpdk",
        Dpdkr => "dpdkr",
        Dpdkvhost => "dpdkvhost",
        Dpdkvhostuser => "dpdkvhostuser",
        Dpdkvhostuserclient => "dpdkvhostuserclient",
        Stt => "stt",
    }
}

wire_enum! {
    /// Port VLAN mode.
    VlanMode, "vlan mode" {
        Access => "access",
        NativeTagged => "native-tagged",
        NativeUntagged => "native-untagged",
        Trunk => "trunk",
    }
}

wire_enum! {
    /// QoS `type` column values.
    QosType, "qos type" {
        LinuxHtb => "linux-htb",
        LinuxHfsc => "linux-hfsc",
        LinuxSfq => "linux-sfq",
        LinuxCodel => "linux-codel",
        LinuxFqCodel => "linux-fq_codel",
        EgressPolicer => "egress-policer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_protocol_parse() {
        assert_eq!(OvsdbProtocol::parse("OpenFlow13"), Some(OvsdbProtocol::OpenFlow13));
        assert_eq!(OvsdbProtocol::parse("openflow13"), None);
        assert_eq!(OvsdbProtocol::ALL.len(), 6);
    }

    #[test]
    fn test_interface_type_round_trip() {
        for ty in InterfaceType::ALL {
            assert_eq!(InterfaceType::parse(ty.as_str()), Some(*ty));
        }
        assert_eq!(InterfaceType::VxlanGpe.as_str(), "vxlan-gpe");
        assert_eq!(InterfaceType::IpsecGre64.as_str(), "ipsec_gre64");
    }

    #[test]
    fn test_unknown_variant_error() {
        let err = "bogus".parse::<FailMode>().unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownVariant {
                kind: "fail mode",
                value: "bogus".to_string()
            }
        );
    }

    #[test]
    fn test_serde_uses_wire_string() {
        let json = serde_json::to_string(&QosType::LinuxFqCodel).unwrap();
        assert_eq!(json, "\"linux-fq_codel\"");
        let mode: VlanMode = serde_json::from_str("\"native-untagged\"").unwrap();
        assert_eq!(mode, VlanMode::NativeUntagged);
    }
}
