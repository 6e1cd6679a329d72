use crate::seed::{SeedConfig, TenantSettings};
use crate::supabase::TableRef;

use super::ServiceError;

/// Tenant schema resolved from a route segment such as `pa`
#[derive(Debug, Clone)]
pub struct Tenant {
    pub settings: TenantSettings,
}

impl Tenant {
    pub fn resolve(seed: &SeedConfig, key: &str) -> Result<Self, ServiceError> {
        let key = key.trim().to_ascii_lowercase();
        seed.tenant(&key)
            .cloned()
            .map(|settings| Tenant { settings })
            .ok_or(ServiceError::UnknownTenant(key))
    }

    pub fn key(&self) -> &str {
        &self.settings.key
    }

    pub fn schema(&self) -> &str {
        &self.settings.schema
    }

    fn table(&self, name: &str) -> TableRef {
        // schema identifiers are validated when the seed config loads
        TableRef {
            schema: self.settings.schema.clone(),
            table: name.to_string(),
        }
    }

    pub fn profiles(&self) -> TableRef {
        self.table("profiles")
    }

    pub fn projects(&self) -> TableRef {
        self.table("projects")
    }

    pub fn mappings(&self) -> TableRef {
        self.table("profiles_projects_mapping")
    }
}
