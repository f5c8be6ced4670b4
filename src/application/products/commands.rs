use tracing::{info, warn};

use crate::application::repos::{
    CreateProductParams, RepoError, SKU_CONSTRAINT, StockChange, UpdateStockParams,
};
use crate::domain::entities::ProductRecord;
use crate::domain::ids::ProductId;
use crate::domain::products::{
    ProductChanges, ProductDraft, check_stock, normalize_reason,
};
use crate::domain::sku::{MAX_SKU_ATTEMPTS, generate_sku};

use super::service::ProductService;
use super::types::{
    CreateProductCommand, PatchProductCommand, ProductError, ReplaceProductCommand,
    UpdateStockCommand, parse_id,
};

impl ProductService {
    pub async fn create_product(
        &self,
        command: CreateProductCommand,
    ) -> Result<ProductRecord, ProductError> {
        let draft = ProductDraft::validate(
            &command.name,
            &command.description,
            command.price,
            command.stock,
            command.is_active,
        )?;

        let mut attempt = 0;
        let product = loop {
            attempt += 1;
            let params = CreateProductParams {
                sku: generate_sku(),
                name: draft.name.clone(),
                description: draft.description.clone(),
                price: draft.price,
                stock: draft.stock,
                is_active: draft.is_active,
            };
            match self.products.create_product(params).await {
                Ok(product) => break product,
                Err(RepoError::Duplicate { constraint }) if constraint == SKU_CONSTRAINT => {
                    if attempt >= MAX_SKU_ATTEMPTS {
                        return Err(ProductError::SkuExhausted { attempts: attempt });
                    }
                    warn!(
                        target = "catalog::products",
                        attempt, "Generated SKU collided; retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        };

        self.after_mutation(&product.id).await;
        info!(
            target = "catalog::products",
            product_id = %product.id,
            sku = %product.sku,
            "Product created"
        );
        Ok(product)
    }

    /// Overwrite every mutable field of an existing product.
    pub async fn replace_product(
        &self,
        id: &str,
        command: ReplaceProductCommand,
    ) -> Result<ProductRecord, ProductError> {
        let id = parse_id(id)?;
        let draft = ProductDraft::validate(
            &command.name,
            &command.description,
            command.price,
            command.stock,
            command.is_active,
        )?;

        let product = self
            .products
            .update_product(&id, &ProductChanges::from_draft(draft))
            .await?;
        self.after_mutation(&id).await;
        Ok(product)
    }

    /// Apply only the fields present in `command`.
    pub async fn update_product(
        &self,
        id: &str,
        command: PatchProductCommand,
    ) -> Result<ProductRecord, ProductError> {
        let id = parse_id(id)?;
        let changes = ProductChanges::validate(
            command.name.as_deref(),
            command.description.as_deref(),
            command.price,
            command.stock,
            command.is_active,
        )?;

        let product = self.products.update_product(&id, &changes).await?;
        self.after_mutation(&id).await;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ProductError> {
        let id = parse_id(id)?;
        self.products.delete_product(&id).await?;
        self.after_mutation(&id).await;
        info!(target = "catalog::products", product_id = %id, "Product deleted");
        Ok(())
    }

    /// Set the stock level, recording the movement that led to it.
    pub async fn update_stock(
        &self,
        id: &str,
        command: UpdateStockCommand,
    ) -> Result<StockChange, ProductError> {
        let id = parse_id(id)?;
        let stock = check_stock(command.stock);
        let reason = normalize_reason(&command.reason);
        let (new_stock, reason) = match (stock, reason) {
            (Ok(stock), Ok(reason)) => (stock, reason),
            (stock, reason) => {
                let violations = [stock.err(), reason.err()].into_iter().flatten().collect();
                return Err(ProductError::Validation(violations));
            }
        };

        let change = self
            .products
            .update_stock(UpdateStockParams {
                id: id.clone(),
                new_stock,
                reason,
            })
            .await?;
        self.after_mutation(&id).await;

        let movement = &change.movement;
        info!(
            target = "catalog::inventory",
            product_id = %id,
            movement = movement.movement_type.as_str(),
            previous_stock = movement.previous_stock,
            new_stock = movement.new_stock,
            "Stock updated"
        );
        if movement.new_stock <= self.settings.low_stock_threshold {
            warn!(
                target = "catalog::inventory",
                product_id = %id,
                sku = %change.product.sku,
                stock = movement.new_stock,
                threshold = self.settings.low_stock_threshold,
                "Product stock is low"
            );
        }
        Ok(change)
    }

    /// Invalidation runs only after the store write committed; its failure is
    /// already logged and counted by the policy and never fails the command.
    async fn after_mutation(&self, id: &ProductId) {
        let _ = self.cache.invalidate_related(id).await;
    }
}
