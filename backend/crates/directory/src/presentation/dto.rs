//! API DTOs (Data Transfer Objects)

use auth::models::SessionUser;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{CategoryGroup, Service, ServiceCategory};
use crate::infra::cdn::DirectoryEntry;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryServices {
    pub category: ServiceCategory,
    pub services: Vec<Service>,
}

impl From<CategoryGroup<'_>> for CategoryServices {
    fn from(group: CategoryGroup<'_>) -> Self {
        Self {
            category: group.category,
            services: group.services.into_iter().cloned().collect(),
        }
    }
}

/// GET /services
#[derive(Debug, Clone, Serialize)]
pub struct ServicesResponse {
    pub featured: Vec<Service>,
    pub categories: Vec<CategoryServices>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeQuery {
    pub error: Option<String>,
}

/// GET /
#[derive(Debug, Clone, Serialize)]
pub struct HomeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub featured: Vec<Service>,
    /// Generic login failure indicator, never provider detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// GET /api/cdn/{*path} on a directory
#[derive(Debug, Clone, Serialize)]
pub struct CdnListing {
    pub items: Vec<DirectoryEntry>,
}
