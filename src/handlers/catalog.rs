// src/handlers/catalog.rs

use axum::{extract::Path, Json};

use crate::models::catalog::{category_by_id, CatalogLabels, ServiceCategory, SERVICE_CATEGORIES};

// GET /api/catalog/categories
#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Categorias de serviço", body = Vec<ServiceCategory>)
    )
)]
pub async fn list_categories() -> Json<Vec<ServiceCategory>> {
    Json(SERVICE_CATEGORIES.to_vec())
}

// GET /api/catalog/labels
#[utoipa::path(
    get,
    path = "/api/catalog/labels",
    tag = "Catalog",
    responses(
        (status = 200, description = "Rótulos de status, prioridade e forma de pagamento", body = CatalogLabels)
    )
)]
pub async fn get_labels() -> Json<CatalogLabels> {
    Json(CatalogLabels::build())
}

// GET /api/catalog/categories/{id}
#[utoipa::path(
    get,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    params(
        ("id" = String, Path, description = "Id da categoria")
    ),
    responses(
        (status = 200, description = "Categoria; ids desconhecidos caem em \"other\"", body = ServiceCategory)
    )
)]
pub async fn get_category(Path(id): Path<String>) -> Json<ServiceCategory> {
    Json(*category_by_id(&id))
}
