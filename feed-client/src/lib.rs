//! Клиентская библиотека социальной ленты.
//!
//! Состоит из двух частей:
//! - `FeedClient`: HTTP-клиент (`reqwest`) к JSON API слоя данных: лента,
//!   посты, профили и мутации (лайк, закладка, комментарий, правка, удаление);
//! - [`interaction`]: контроллер оптимистичных взаимодействий с одним постом,
//!   который применяет изменение локально до ответа сервера и откатывает его
//!   при ошибке.
//!
//! Аутентификация выполняется внешним провайдером: клиент лишь хранит выданный
//! им bearer-токен и прикладывает его к запросам.
#![warn(missing_docs)]

mod error;
mod http_client;
pub mod interaction;
mod models;
mod mutations;

pub use error::{FeedClientError, FeedClientResult};
pub use http_client::HttpConfig;
pub use models::{Author, Bookmark, Comment, Like, MutationResult, Post, Profile, Viewer};
pub use mutations::PostMutations;

use http_client::HttpClient;

#[derive(Debug, Clone)]
/// Клиент API ленты.
pub struct FeedClient {
    http: HttpClient,
    token: Option<String>,
}

impl FeedClient {
    /// Создаёт клиент с заданной HTTP-конфигурацией.
    pub fn new(config: HttpConfig) -> FeedClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            token: None,
        })
    }

    /// Устанавливает bearer-токен, выданный провайдером идентификации.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Возвращает ленту постов. `limit` ограничивает размер выдачи на сервере.
    pub async fn list_posts(&self, limit: Option<u32>) -> FeedClientResult<Vec<Post>> {
        self.http.list_posts(self.get_token(), limit).await
    }

    /// Возвращает пост по идентификатору.
    pub async fn get_post(&self, id: &str) -> FeedClientResult<Post> {
        self.http.get_post(self.get_token(), id).await
    }

    /// Создаёт пост. Требует токен.
    pub async fn create_post(
        &self,
        content: &str,
        image: Option<&str>,
    ) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.create_post(token, content, image).await
    }

    /// Определяет текущего зрителя.
    ///
    /// Без токена запрос не выполняется: зритель считается анонимным.
    pub async fn current_viewer(&self) -> FeedClientResult<Viewer> {
        match self.get_token() {
            Some(token) => self.http.current_viewer(token).await,
            None => Ok(Viewer::anonymous()),
        }
    }

    /// Возвращает профиль по логину.
    pub async fn get_profile(&self, username: &str) -> FeedClientResult<Profile> {
        self.http.get_profile(self.get_token(), username).await
    }

    /// Посты пользователя.
    pub async fn user_posts(&self, user_id: &str) -> FeedClientResult<Vec<Post>> {
        self.http
            .user_posts(self.get_token(), user_id, "posts")
            .await
    }

    /// Посты, которые пользователь лайкнул.
    pub async fn user_liked_posts(&self, user_id: &str) -> FeedClientResult<Vec<Post>> {
        self.http
            .user_posts(self.get_token(), user_id, "liked")
            .await
    }

    /// Посты в закладках пользователя.
    pub async fn user_bookmarked_posts(&self, user_id: &str) -> FeedClientResult<Vec<Post>> {
        self.http
            .user_posts(self.get_token(), user_id, "bookmarks")
            .await
    }

    /// Подписан ли текущий зритель на пользователя. Для анонимного зрителя всегда `false`.
    pub async fn is_following(&self, user_id: &str) -> FeedClientResult<bool> {
        match self.get_token() {
            Some(token) => self.http.is_following(token, user_id).await,
            None => Ok(false),
        }
    }

    /// Подписывает на пользователя или отписывает от него. Требует токен.
    pub async fn toggle_follow(&self, user_id: &str) -> FeedClientResult<MutationResult> {
        let token = self.require_token()?;
        self.http.toggle_follow(token, user_id).await
    }

    fn require_token(&self) -> FeedClientResult<&str> {
        self.token.as_deref().ok_or(FeedClientError::Unauthorized)
    }
}
