// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::planner_login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::get_category,
        handlers::catalog::get_labels,

        // --- Requests ---
        handlers::requests::create_request,
        handlers::requests::list_requests,
        handlers::requests::list_my_requests,
        handlers::requests::list_owner_requests,
        handlers::requests::get_request,
        handlers::requests::update_request,
        handlers::requests::delete_request,
        handlers::requests::settle_payment,
        handlers::events::stream_changes,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_financial_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisteredUser,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::PlannerLoginPayload,
            models::auth::AuthResponse,

            // --- Requests ---
            models::service_request::Status,
            models::service_request::Priority,
            models::service_request::PaymentMethod,
            models::service_request::Payment,
            models::service_request::ServiceRequest,
            models::service_request::NewServiceRequest,
            models::service_request::RequestUpdate,
            models::service_request::SettlePaymentPayload,
            services::events::ChangeKind,
            services::events::ChangeEvent,

            // --- Catalog ---
            models::catalog::ServiceCategory,
            models::catalog::CatalogLabels,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::FinancialSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e logout"),
        (name = "Users", description = "Dados do usuário da sessão"),
        (name = "Catalog", description = "Categorias e rótulos de referência"),
        (name = "Requests", description = "Chamados de manutenção e cobrança"),
        (name = "Dashboard", description = "Indicadores do painel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
