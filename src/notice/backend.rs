use super::address::officer_for_postal;
use super::state::GenerateRequest;
use crate::api::{
    ApiClient, ApiError, ApiResult, GeneratedDocument, SaveEmployerEntryRequest, UpdateCaseRequest,
};
use crate::models::SavedAddress;

/// Backend calls the notice popup depends on.
///
/// Implemented by [`ApiClient`]; tests substitute a recording fake.
#[allow(async_fn_in_trait)]
pub(crate) trait NoticeBackend {
    async fn saved_addresses(
        &self,
        identity: &str,
        establishment_code: &str,
    ) -> ApiResult<Vec<SavedAddress>>;

    async fn saved_names(&self, identity: &str, establishment_code: &str)
        -> ApiResult<Vec<String>>;

    /// Officer already assigned to some case in `postal_code`.
    async fn lookup_officer(&self, identity: &str, postal_code: &str) -> ApiResult<Option<String>>;

    async fn save_entry(&self, req: &SaveEmployerEntryRequest) -> ApiResult<()>;

    async fn delete_address(&self, identity: &str, id: &str) -> ApiResult<()>;

    async fn update_case(&self, case_id: &str, req: &UpdateCaseRequest) -> ApiResult<()>;

    async fn draft_letter_body(&self, prompt: &str) -> ApiResult<String>;

    async fn generate(&self, slug: &str, req: &GenerateRequest) -> ApiResult<GeneratedDocument>;
}

impl NoticeBackend for ApiClient {
    async fn saved_addresses(
        &self,
        identity: &str,
        establishment_code: &str,
    ) -> ApiResult<Vec<SavedAddress>> {
        self.get_saved_addresses(identity, establishment_code).await
    }

    async fn saved_names(
        &self,
        identity: &str,
        establishment_code: &str,
    ) -> ApiResult<Vec<String>> {
        self.get_saved_names(identity, establishment_code).await
    }

    async fn lookup_officer(&self, identity: &str, postal_code: &str) -> ApiResult<Option<String>> {
        let cases = self.list_cases(identity).await?;
        Ok(officer_for_postal(&cases, postal_code))
    }

    async fn save_entry(&self, req: &SaveEmployerEntryRequest) -> ApiResult<()> {
        self.save_employer_entry(req).await
    }

    async fn delete_address(&self, identity: &str, id: &str) -> ApiResult<()> {
        self.delete_saved_address(identity, id).await
    }

    async fn update_case(&self, case_id: &str, req: &UpdateCaseRequest) -> ApiResult<()> {
        ApiClient::update_case(self, case_id, req).await
    }

    async fn draft_letter_body(&self, prompt: &str) -> ApiResult<String> {
        self.generate_letter_body(prompt).await
    }

    async fn generate(&self, slug: &str, req: &GenerateRequest) -> ApiResult<GeneratedDocument> {
        let body = serde_json::to_value(req).map_err(ApiError::parse)?;
        self.generate_notice(slug, &body).await
    }
}
