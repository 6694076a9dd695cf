pub mod normalize;
pub mod risk_advisor;
pub mod zapper;

pub use normalize::positions_from_snapshot;
pub use risk_advisor::HttpRiskAdvisor;
pub use zapper::ZapperClient;
