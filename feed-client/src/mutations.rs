use async_trait::async_trait;

use crate::FeedClient;
use crate::error::FeedClientResult;
use crate::models::MutationResult;

/// Серверные мутации, через которые контроллер взаимодействий меняет пост.
///
/// `Err` означает сбой транспорта или сервера; `Ok` с `success == false`:
/// штатный отказ, возможно с причиной.
#[async_trait]
pub trait PostMutations: Send + Sync {
    /// Переключает лайк текущего пользователя.
    async fn toggle_like(&self, post_id: &str) -> FeedClientResult<MutationResult>;
    /// Переключает закладку текущего пользователя.
    async fn toggle_bookmark(&self, post_id: &str) -> FeedClientResult<MutationResult>;
    /// Создаёт комментарий.
    async fn create_comment(&self, post_id: &str, content: &str)
    -> FeedClientResult<MutationResult>;
    /// Заменяет текст поста.
    async fn update_post(&self, post_id: &str, content: &str) -> FeedClientResult<MutationResult>;
    /// Удаляет пост.
    async fn delete_post(&self, post_id: &str) -> FeedClientResult<MutationResult>;
}

#[async_trait]
impl PostMutations for FeedClient {
    async fn toggle_like(&self, post_id: &str) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.toggle_like(token, post_id).await
    }

    async fn toggle_bookmark(&self, post_id: &str) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.toggle_bookmark(token, post_id).await
    }

    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
    ) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.create_comment(token, post_id, content).await
    }

    async fn update_post(&self, post_id: &str, content: &str) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.update_post(token, post_id, content).await
    }

    async fn delete_post(&self, post_id: &str) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.delete_post(token, post_id).await
    }
}
