use crate::application::pagination::Page;
use crate::application::repos::RepoError;
use crate::cache::keys::list_key;
use crate::domain::entities::{ProductRecord, StockMovementRecord};

use super::service::ProductService;
use super::types::{
    ListProductsQuery, ListingPlan, ProductError, SearchProductsQuery, parse_id,
};

impl ProductService {
    pub async fn get_product(&self, id: &str) -> Result<ProductRecord, ProductError> {
        let id = parse_id(id)?;
        let products = self.products.clone();
        let lookup = id.clone();
        self.cache
            .entity_or_load(&id, || async move { products.find_by_id(&lookup).await })
            .await?
            .ok_or(ProductError::NotFound)
    }

    pub async fn list_products(
        &self,
        query: ListProductsQuery,
    ) -> Result<Page<ProductRecord>, ProductError> {
        let plan = query.into_plan(self.settings.limits)?;
        self.load_listing(plan).await
    }

    /// Text and price search; an absent `q` lists everything.
    pub async fn search_products(
        &self,
        query: SearchProductsQuery,
    ) -> Result<Page<ProductRecord>, ProductError> {
        let plan = ListProductsQuery::from(query).into_plan(self.settings.limits)?;
        self.load_listing(plan).await
    }

    /// Movements for an existing product, oldest first.
    pub async fn stock_movements(
        &self,
        id: &str,
    ) -> Result<Vec<StockMovementRecord>, ProductError> {
        let product = self.get_product(id).await?;
        self.movements
            .list_stock_movements(&product.id)
            .await
            .map_err(ProductError::from)
    }

    async fn load_listing(&self, plan: ListingPlan) -> Result<Page<ProductRecord>, ProductError> {
        let key = list_key(&plan.filter, plan.sort, plan.page);
        let products = self.products.clone();

        self.cache
            .list_or_load(&key, || async move {
                let ListingPlan { filter, sort, page } = plan;
                let (items, total) = tokio::try_join!(
                    products.list_products(&filter, sort, page),
                    products.count_products(&filter)
                )?;
                Ok::<_, RepoError>(page.into_page(items, total))
            })
            .await
            .map_err(ProductError::from)
    }
}
