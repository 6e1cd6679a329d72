pub mod allocator;

pub use allocator::{split_name, TenantIdAllocator};

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;
use crate::supabase::query::{validate_identifier, TableRef};

const BUILTIN_SEED: &str = include_str!("../../config/seed.yaml");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed configuration: {0}")]
    Invalid(String),
}

/// Demo data and tenant settings injected at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Written to created_by / updated_by of seeded rows
    pub default_actor_id: String,
    pub default_capacity: i64,
    pub domains: Vec<DomainRule>,
    pub records: Vec<DemoRecord>,
    pub tenants: Vec<TenantSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRule {
    pub domain: String,
    /// Prefix of the tenant-local id, e.g. ACME for ACME001
    pub prefix: String,
    /// Tenant-local project the domain's users are mapped to
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    pub key: String,
    pub schema: String,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub cascade: Vec<DependentTable>,
}

/// Child table whose rows reference a profile through `column`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependentTable {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl DependentTable {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            schema: self.schema.clone(),
            table: self.table.clone(),
        }
    }
}

impl SeedConfig {
    pub fn builtin() -> Result<Self, SeedError> {
        Self::from_yaml(BUILTIN_SEED)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SeedError> {
        let config: SeedConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Seed file from configuration, or the built-in one
    pub fn load(path: Option<&str>) -> Result<Self, SeedError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::builtin(),
        }
    }

    pub fn tenant(&self, key: &str) -> Option<&TenantSettings> {
        self.tenants.iter().find(|t| t.key == key)
    }

    pub fn domain_rule(&self, domain: &str) -> Option<&DomainRule> {
        self.domains.iter().find(|d| d.domain.eq_ignore_ascii_case(domain))
    }

    /// True when the email belongs to one of the configured domains
    pub fn is_allowed_email(&self, email: &str) -> bool {
        self.domains
            .iter()
            .any(|d| email.contains(&format!("@{}", d.domain)))
    }

    pub fn allocator(&self) -> TenantIdAllocator {
        TenantIdAllocator::new(
            self.domains
                .iter()
                .map(|d| (d.domain.clone(), d.prefix.clone())),
        )
    }

    fn validate(&self) -> Result<(), SeedError> {
        let mut keys = HashSet::new();
        for tenant in &self.tenants {
            if !keys.insert(tenant.key.as_str()) {
                return Err(SeedError::Invalid(format!("duplicate tenant key {}", tenant.key)));
            }
            validate_identifier(&tenant.schema)
                .map_err(|e| SeedError::Invalid(format!("tenant {}: {}", tenant.key, e)))?;
            for dep in &tenant.cascade {
                for name in [&dep.schema, &dep.table, &dep.column] {
                    validate_identifier(name)
                        .map_err(|e| SeedError::Invalid(format!("tenant {} cascade: {}", tenant.key, e)))?;
                }
            }
        }

        for rule in &self.domains {
            if rule.domain.trim().is_empty() || rule.prefix.trim().is_empty() {
                return Err(SeedError::Invalid("domain rules need a domain and a prefix".to_string()));
            }
        }

        for record in &self.records {
            if record.name.split_whitespace().next().is_none() {
                return Err(SeedError::Invalid(format!("record {} has an empty name", record.email)));
            }
        }

        Ok(())
    }
}
