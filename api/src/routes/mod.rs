use domain::{AddressError, WalletAddress};
use serde::Deserialize;

pub mod analyze;
pub mod health;
pub mod positions;

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    address: Option<String>,
}

impl AddressQuery {
    pub fn wallet(&self) -> Result<WalletAddress, AddressError> {
        WalletAddress::parse(self.address.as_deref().unwrap_or_default())
    }
}
