use uuid::Uuid;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::user::{MessageResponse, User, UserUpdateRequest};

impl ApiClient {
    /// Admin-only on the server side; non-admins get a 403.
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get("users").await
    }

    pub async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        self.get(&format!("users/{id}")).await
    }

    pub async fn update_user(&self, id: Uuid, request: &UserUpdateRequest) -> ApiResult<User> {
        self.put(&format!("users/{id}"), request).await
    }

    pub async fn delete_user(&self, id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self.delete(&format!("users/{id}")).await?;
        Ok(())
    }
}
