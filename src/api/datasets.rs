use uuid::Uuid;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::dataset::{
    Dataset, DatasetCreateRequest, DatasetUpdateRequest, QueryRequest, TableData,
};
use crate::models::page::{PageQuery, Paginated};
use crate::models::user::MessageResponse;

impl ApiClient {
    pub async fn list_datasets(&self, page: PageQuery) -> ApiResult<Paginated<Dataset>> {
        self.get_with_query("datasets", &page.to_params()).await
    }

    pub async fn get_dataset(&self, id: Uuid) -> ApiResult<Dataset> {
        self.get(&format!("datasets/{id}")).await
    }

    pub async fn create_dataset(&self, request: &DatasetCreateRequest) -> ApiResult<Dataset> {
        self.post("datasets", request).await
    }

    pub async fn update_dataset(&self, id: Uuid, request: &DatasetUpdateRequest) -> ApiResult<Dataset> {
        self.put(&format!("datasets/{id}"), request).await
    }

    pub async fn delete_dataset(&self, id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self.delete(&format!("datasets/{id}")).await?;
        Ok(())
    }

    /// Run an ad-hoc SQL query against a registered data source. Execution
    /// happens server-side; the client only ships the text.
    pub async fn execute_query(&self, request: &QueryRequest) -> ApiResult<TableData> {
        self.post("datasets/execute-query", request).await
    }

    /// Fetch the first rows of a dataset. `limit` is capped by the server.
    pub async fn preview_dataset(&self, id: Uuid, limit: Option<u32>) -> ApiResult<TableData> {
        let path = format!("datasets/{id}/preview");
        match limit {
            Some(limit) => {
                self.get_with_query(&path, &[("limit", limit.to_string())]).await
            }
            None => self.get(&path).await,
        }
    }
}
