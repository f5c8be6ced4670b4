use std::sync::Arc;

use crate::application::products::ProductService;

use crate::infra::http::HealthProbe;

#[derive(Clone)]
pub struct ApiState {
    pub products: Arc<ProductService>,
    pub health: Arc<dyn HealthProbe>,
}
