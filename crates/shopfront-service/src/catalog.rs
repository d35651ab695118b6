//! Catalog service: product CRUD, listing, search and filtering.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shopfront_core::validation::{
    validate_create_product, validate_pagination, validate_product_filter, validate_search_keyword,
    validate_sku, validate_update_product,
};
use shopfront_core::{CreateProduct, Pagination, Product, ProductFilter, UpdateProduct};

use crate::error::{ServiceError, ServiceResult};
use crate::port::{CatalogStore, StoreError};

/// Product management on top of a [`CatalogStore`].
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// Unique violations on insert/update name the column; turn them into the
/// caller-facing conflict.
fn conflict_on(err: StoreError, req_sku: &str, req_name: &str) -> ServiceError {
    match err {
        StoreError::UniqueViolation { field } if field == "sku" => {
            ServiceError::already_exists("product sku", req_sku)
        }
        StoreError::UniqueViolation { .. } => ServiceError::already_exists("product", req_name),
        other => other.into(),
    }
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a product. Active names and all SKUs are unique.
    pub async fn create_product(&self, req: CreateProduct) -> ServiceResult<Product> {
        let req = CreateProduct {
            sku: req.sku.trim().to_string(),
            name: req.name.trim().to_string(),
            ..req
        };
        validate_create_product(&req)?;

        if self.store.get_product_by_name(&req.name).await?.is_some() {
            return Err(ServiceError::already_exists("product", &req.name));
        }

        let product = self
            .store
            .insert_product(&req, Utc::now())
            .await
            .map_err(|e| conflict_on(e, &req.sku, &req.name))?;

        info!(id = product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// One page of active products ordered by id.
    pub async fn list_products(&self, page: Pagination) -> ServiceResult<Vec<Product>> {
        validate_pagination(&page)?;
        let products = self.store.list_products(page).await?;
        debug!(cursor = page.cursor, size = page.size, count = products.len(), "Listed products");
        Ok(products)
    }

    pub async fn product_detail(&self, sku: &str) -> ServiceResult<Product> {
        validate_sku(sku)?;
        self.store
            .get_product_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", sku))
    }

    /// Replaces name, stock and price. The SKU never changes.
    pub async fn update_product(&self, id: i64, req: UpdateProduct) -> ServiceResult<Product> {
        let req = UpdateProduct {
            name: req.name.trim().to_string(),
            ..req
        };
        validate_update_product(&req)?;

        let mut product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))?;

        if let Some(other) = self.store.get_product_by_name(&req.name).await? {
            if other.id != id {
                return Err(ServiceError::already_exists("product", &req.name));
            }
        }

        product.name = req.name;
        product.stock = req.stock;
        product.price_cents = req.price_cents;
        product.updated_at = Utc::now();

        let sku = product.sku.clone();
        let updated = self
            .store
            .update_product(&product)
            .await
            .map_err(|e| conflict_on(e, &sku, &product.name))?;
        if !updated {
            return Err(ServiceError::not_found("product", id));
        }

        info!(id, sku = %product.sku, "Product updated");
        Ok(product)
    }

    /// Soft-deletes a product. Its transactions stay in history.
    pub async fn delete_product(&self, id: i64) -> ServiceResult<()> {
        if !self.store.soft_delete_product(id, Utc::now()).await? {
            return Err(ServiceError::not_found("product", id));
        }
        info!(id, "Product deleted");
        Ok(())
    }

    /// Case-insensitive match on name or SKU.
    pub async fn search_products(&self, keyword: &str, page: Pagination) -> ServiceResult<Vec<Product>> {
        let keyword = validate_search_keyword(keyword)?;
        validate_pagination(&page)?;
        Ok(self.store.search_products(&keyword, page).await?)
    }

    /// Inclusive price/stock ranges.
    pub async fn filter_products(&self, filter: ProductFilter, page: Pagination) -> ServiceResult<Vec<Product>> {
        validate_product_filter(&filter)?;
        validate_pagination(&page)?;
        Ok(self.store.filter_products(filter, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ErrorKind;

    fn service() -> CatalogService<InMemoryStore> {
        CatalogService::new(Arc::new(InMemoryStore::new()))
    }

    fn req(sku: &str, name: &str, stock: i64, price_cents: i64) -> CreateProduct {
        CreateProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            stock,
            price_cents,
        }
    }

    #[tokio::test]
    async fn test_create_and_detail() {
        let catalog = service();
        let created = catalog.create_product(req("KOPI-1", " Kopi Susu ", 10, 1_500)).await.unwrap();
        assert_eq!(created.name, "Kopi Susu");

        let found = catalog.product_detail("KOPI-1").await.unwrap();
        assert_eq!(found, created);

        let err = catalog.product_detail("NOPE").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let catalog = service();
        catalog.create_product(req("A", "Teh", 1, 100)).await.unwrap();

        let err = catalog.create_product(req("B", "Teh", 1, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = catalog.create_product(req("A", "Other", 1, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let catalog = service();
        let err = catalog.create_product(req("A", "Teh", -1, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = catalog
            .list_products(Pagination { cursor: 0, size: 0 })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let inverted = ProductFilter {
            min_stock: 10,
            max_stock: 1,
            ..ProductFilter::default()
        };
        let err = catalog
            .filter_products(inverted, Pagination::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_update_product() {
        let catalog = service();
        let a = catalog.create_product(req("A", "Teh", 1, 100)).await.unwrap();
        catalog.create_product(req("B", "Kopi", 1, 100)).await.unwrap();

        let updated = catalog
            .update_product(
                a.id,
                UpdateProduct {
                    name: "Teh".to_string(),
                    stock: 7,
                    price_cents: 250,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.sku, "A");
        assert!(updated.updated_at >= a.updated_at);

        let err = catalog
            .update_product(
                a.id,
                UpdateProduct {
                    name: "Kopi".to_string(),
                    stock: 7,
                    price_cents: 250,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = catalog
            .update_product(
                999,
                UpdateProduct {
                    name: "Ghost".to_string(),
                    stock: 1,
                    price_cents: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let catalog = service();
        let a = catalog.create_product(req("A", "Teh", 1, 100)).await.unwrap();

        catalog.delete_product(a.id).await.unwrap();
        assert_eq!(
            catalog.product_detail("A").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            catalog.delete_product(a.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // The name is free again once the product is gone.
        catalog.create_product(req("A2", "Teh", 1, 100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_listing_search_filter() {
        let catalog = service();
        for (sku, name, stock, price) in [
            ("KOPI-1", "Kopi Susu", 5, 1_500),
            ("TEH-1", "Teh Manis", 0, 800),
            ("KOPI-2", "Kopi Hitam", 20, 1_200),
        ] {
            catalog.create_product(req(sku, name, stock, price)).await.unwrap();
        }

        let first = catalog
            .list_products(Pagination { cursor: 0, size: 2 })
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        let rest = catalog
            .list_products(Pagination {
                cursor: first[1].id,
                size: 2,
            })
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].sku, "KOPI-2");

        let found = catalog.search_products("kopi", Pagination::default()).await.unwrap();
        assert_eq!(found.len(), 2);
        let found = catalog.search_products("teh-", Pagination::default()).await.unwrap();
        assert_eq!(found.len(), 1);

        let in_stock = catalog
            .filter_products(
                ProductFilter {
                    min_stock: 1,
                    max_price_cents: 1_300,
                    ..ProductFilter::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].sku, "KOPI-2");
    }
}
