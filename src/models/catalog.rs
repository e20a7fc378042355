// src/models/catalog.rs

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::service_request::{PaymentMethod, Priority, Status};

/// Categoria fixa de serviço (dados de referência, não persistidos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServiceCategory {
    #[schema(value_type = String, example = "hydraulic")]
    pub id: &'static str,
    #[schema(value_type = String, example = "Hidráulica")]
    pub name: &'static str,
    #[schema(value_type = String, example = "Wrench")]
    pub icon: &'static str,
    #[schema(value_type = String)]
    pub description: &'static str,
}

pub const FALLBACK_CATEGORY_ID: &str = "other";

pub static SERVICE_CATEGORIES: [ServiceCategory; 9] = [
    ServiceCategory {
        id: "hydraulic",
        name: "Hidráulica",
        icon: "Wrench",
        description: "Reparos em encanamentos, torneiras, válvulas",
    },
    ServiceCategory {
        id: "electrical",
        name: "Elétrica",
        icon: "Zap",
        description: "Instalações elétricas, tomadas, iluminação",
    },
    ServiceCategory {
        id: "air-conditioning",
        name: "Ar Condicionado",
        icon: "Wind",
        description: "Manutenção e reparo de sistemas de climatização",
    },
    ServiceCategory {
        id: "cleaning",
        name: "Limpeza",
        icon: "Sparkles",
        description: "Limpeza profunda, manutenção de áreas comuns",
    },
    ServiceCategory {
        id: "carpentry",
        name: "Carpintaria",
        icon: "Hammer",
        description: "Reparos em portas, janelas, móveis",
    },
    ServiceCategory {
        id: "painting",
        name: "Pintura",
        icon: "Brush",
        description: "Pintura de paredes, retoques, acabamentos",
    },
    ServiceCategory {
        id: "security",
        name: "Segurança",
        icon: "Shield",
        description: "Fechaduras, portões, sistemas de segurança",
    },
    ServiceCategory {
        id: "gardening",
        name: "Jardinagem",
        icon: "TreePine",
        description: "Manutenção de jardins e áreas verdes",
    },
    ServiceCategory {
        id: FALLBACK_CATEGORY_ID,
        name: "Outros",
        icon: "Settings",
        description: "Outros serviços não listados",
    },
];

/// Resolve a categoria pelo id; ids desconhecidos caem em "Outros".
pub fn category_by_id(id: &str) -> &'static ServiceCategory {
    SERVICE_CATEGORIES
        .iter()
        .find(|c| c.id == id)
        .unwrap_or(&SERVICE_CATEGORIES[SERVICE_CATEGORIES.len() - 1])
}

/// Dicionários de rótulos exibidos na interface.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogLabels {
    pub status: BTreeMap<String, String>,
    pub priority: BTreeMap<String, String>,
    pub payment_method: BTreeMap<String, String>,
}

impl CatalogLabels {
    pub fn build() -> Self {
        Self {
            status: Status::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), s.label().to_string()))
                .collect(),
            priority: Priority::ALL
                .iter()
                .map(|p| (p.as_str().to_string(), p.label().to_string()))
                .collect(),
            payment_method: PaymentMethod::ALL
                .iter()
                .map(|m| (m.as_str().to_string(), m.label().to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_resolve_to_their_entry() {
        let category = category_by_id("air-conditioning");
        assert_eq!(category.name, "Ar Condicionado");
        assert_eq!(category.icon, "Wind");
    }

    #[test]
    fn unknown_ids_fall_back_to_other() {
        assert_eq!(category_by_id("plumbing").id, FALLBACK_CATEGORY_ID);
        assert_eq!(category_by_id("").name, "Outros");
    }

    #[test]
    fn category_ids_are_unique() {
        let mut ids: Vec<_> = SERVICE_CATEGORIES.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), SERVICE_CATEGORIES.len());
    }

    #[test]
    fn labels_cover_every_variant() {
        let labels = CatalogLabels::build();
        assert_eq!(labels.status["in-progress"], "Em Andamento");
        assert_eq!(labels.priority.len(), 4);
        assert_eq!(labels.payment_method["transfer"], "Transferência");
    }
}
