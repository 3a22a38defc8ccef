use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::database::models::{Company, CompanyChanges};
use crate::database::{StoreError, TransactionalStore};
use crate::types::UpdateCompanyRequest;
use crate::validation::{validate_update_company, ValidationError};

#[derive(Debug, Error)]
pub enum CompanyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Company not found")]
    NotFound,

    #[error("Company name already exists: {0}")]
    NameTaken(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for CompanyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => CompanyError::NotFound,
            other => CompanyError::Storage(other),
        }
    }
}

/// Reads and maintenance of provisioned companies
pub struct CompanyService {
    store: Arc<dyn TransactionalStore>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    pub async fn get_company(&self, id: i32) -> Result<Company, CompanyError> {
        Ok(self.store.company_by_id(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Company, CompanyError> {
        Ok(self.store.company_by_name(name.trim()).await?)
    }

    pub async fn update_company(
        &self,
        id: i32,
        request: UpdateCompanyRequest,
    ) -> Result<Company, CompanyError> {
        validate_update_company(&request)?;

        let name = request.name.trim().to_string();
        let changes = CompanyChanges {
            name: name.clone(),
            industry: request.industry.trim().to_string(),
            country: request.country.trim().to_string(),
            timezone: request.timezone.trim().to_string(),
        };

        match self.store.update_company(id, changes).await {
            Ok(company) => {
                info!(company_id = company.id, "Updated company");
                Ok(company)
            }
            Err(StoreError::Conflict(_)) => Err(CompanyError::NameTaken(name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the company together with its tenant and everything under it
    pub async fn delete_company(&self, id: i32) -> Result<(), CompanyError> {
        self.store.delete_company(id).await?;
        info!(company_id = id, "Deleted company");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::RowCounts;
    use crate::database::models::NewCompany;
    use crate::database::{CompanyStore, MemoryStore};

    async fn seeded() -> (MemoryStore, CompanyService, Company) {
        let store = MemoryStore::new();
        let company = store
            .create_company(NewCompany {
                name: "Acme".to_string(),
                industry: String::new(),
                country: "Nigeria".to_string(),
                timezone: "Africa/Lagos".to_string(),
            })
            .await
            .unwrap();
        let service = CompanyService::new(Arc::new(store.clone()));
        (store, service, company)
    }

    fn changes(name: &str) -> UpdateCompanyRequest {
        UpdateCompanyRequest {
            name: name.to_string(),
            industry: "Retail".to_string(),
            country: "Ghana".to_string(),
            timezone: "Africa/Accra".to_string(),
        }
    }

    #[tokio::test]
    async fn finds_by_id_and_name() {
        let (_, service, company) = seeded().await;
        assert_eq!(service.get_company(company.id).await.unwrap(), company);
        assert_eq!(service.find_by_name(" Acme ").await.unwrap(), company);
        assert!(matches!(
            service.get_company(company.id + 100).await,
            Err(CompanyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn updates_fields() {
        let (_, service, company) = seeded().await;
        let updated = service
            .update_company(company.id, changes("Acme West"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme West");
        assert_eq!(updated.country, "Ghana");
        assert!(updated.updated_at >= company.updated_at);
    }

    #[tokio::test]
    async fn update_to_taken_name_conflicts() {
        let (store, service, company) = seeded().await;
        store
            .create_company(NewCompany {
                name: "Globex".to_string(),
                industry: String::new(),
                country: "Kenya".to_string(),
                timezone: "Africa/Nairobi".to_string(),
            })
            .await
            .unwrap();

        let err = service
            .update_company(company.id, changes("Globex"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompanyError::NameTaken(name) if name == "Globex"));
    }

    #[tokio::test]
    async fn update_validates_before_writing() {
        let (_, service, company) = seeded().await;
        let err = service
            .update_company(company.id, changes(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CompanyError::Validation(_)));
        assert_eq!(service.get_company(company.id).await.unwrap(), company);
    }

    #[tokio::test]
    async fn delete_removes_company() {
        let (store, service, company) = seeded().await;
        service.delete_company(company.id).await.unwrap();
        assert_eq!(store.counts().await, RowCounts::default());
        assert!(matches!(
            service.delete_company(company.id).await,
            Err(CompanyError::NotFound)
        ));
    }
}
