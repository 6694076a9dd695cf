use std::sync::Arc;

use advisor::RiskAdvisor;
use indexer::PortfolioSource;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub portfolio: Arc<dyn PortfolioSource>,
    pub advisor: Arc<dyn RiskAdvisor>,
}

#[allow(dead_code)]
fn _assert_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}
