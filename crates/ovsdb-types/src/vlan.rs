//! VLAN ID type with validation.

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IEEE 802.1Q VLAN identifier as accepted by the Port `tag` and
/// `trunks` columns (0-4095).
///
/// # Examples
///
/// ```
/// use ovsdb_types::VlanId;
///
/// let vlan = VlanId::new(100).unwrap();
/// assert_eq!(vlan.as_u16(), 100);
///
/// assert!(VlanId::new(4096).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4095;

    /// Creates a new VLAN ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the VLAN ID is above 4095.
    pub const fn new(id: u16) -> Result<Self, ModelError> {
        if id <= Self::MAX {
            Ok(VlanId(id))
        } else {
            Err(ModelError::InvalidVlanId(id))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u16 = s
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidVlanId(u16::MAX))?;
        VlanId::new(id)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ModelError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

impl From<VlanId> for i64 {
    fn from(vlan: VlanId) -> i64 {
        i64::from(vlan.0)
    }
}
