//! Role and region entities (database row mappings).

use sqlx::FromRow;

/// Database row mapping for the roles table.
#[derive(Debug, Clone, FromRow)]
pub struct RoleEntity {
    pub name: String,
    pub permissions: serde_json::Value,
}

impl From<RoleEntity> for domain::models::Role {
    fn from(entity: RoleEntity) -> Self {
        Self {
            name: entity.name,
            permissions: entity.permissions,
        }
    }
}

/// Database row mapping for the regions table.
#[derive(Debug, Clone, FromRow)]
pub struct RegionEntity {
    pub name: String,
}

impl From<RegionEntity> for domain::models::Region {
    fn from(entity: RegionEntity) -> Self {
        Self { name: entity.name }
    }
}
