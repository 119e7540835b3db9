use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{FeedClientError, FeedClientResult};
use crate::models::{Author, Bookmark, Comment, Like, MutationResult, Post, Profile, Viewer};

#[derive(Debug, Serialize)]
struct CreatePostRequestDto<'a> {
    content: &'a str,
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ContentRequestDto<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountDto {
    likes: i64,
}

#[derive(Debug, Deserialize)]
struct PostDto {
    id: String,
    content: Option<String>,
    image: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    author: Author,
    #[serde(default)]
    likes: Vec<Like>,
    #[serde(default)]
    bookmarks: Vec<Bookmark>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(rename = "_count")]
    count: CountDto,
}

#[derive(Debug, Deserialize)]
struct FollowStatusDto {
    following: bool,
}

#[derive(Serialize)]
struct FeedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl From<PostDto> for Post {
    fn from(value: PostDto) -> Self {
        Self {
            id: value.id,
            content: value.content,
            image: value.image,
            created_at: value.created_at,
            author: value.author,
            likes: value.likes,
            bookmarks: value.bookmarks,
            comments: value.comments,
            like_count: value.count.likes.max(0),
        }
    }
}

#[derive(Debug, Clone)]
/// Параметры HTTP-транспорта.
pub struct HttpConfig {
    /// Базовый URL API, например `http://127.0.0.1:3000`.
    pub base_url: String,
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub request_timeout: Duration,
}

impl HttpConfig {
    /// Конфигурация с таймаутами по умолчанию (5s на соединение, 15s на запрос).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для JSON API слоя данных ленты.
pub(crate) struct HttpClient {
    base_url: Url,
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(config: HttpConfig) -> FeedClientResult<Self> {
        let raw = config.base_url.trim();
        if raw.is_empty() {
            return Err(FeedClientError::InvalidConfig(
                "base url must not be empty".to_string(),
            ));
        }
        let base_url = Url::parse(raw)
            .map_err(|e| FeedClientError::InvalidConfig(format!("invalid base url {raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FeedClientError::InvalidConfig(format!(
                "base url {raw} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Добавляет сегменты к пути базового URL. Каждый сегмент экранируется
    /// целиком, поэтому `/`, `?` и `#` из идентификаторов не меняют маршрут.
    fn endpoint(&self, segments: &[&str]) -> FeedClientResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(FeedClientError::InvalidRequest(format!(
                "invalid path segment {bad:?}"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FeedClientError::InvalidConfig("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> FeedClientResult<RequestBuilder> {
        let request = self.client.request(method, self.endpoint(segments)?);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn decode_error(response: reqwest::Response) -> FeedClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .error
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        FeedClientError::from_http_status(status, Some(message))
    }

    /// отправляет запрос и декодирует json-ответ; не-2xx превращается в ошибку
    async fn dispatch<TRes>(request: RequestBuilder) -> FeedClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(FeedClientError::from_reqwest)
    }

    async fn get_json<TRes>(&self, path: &[&str], token: Option<&str>) -> FeedClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        Self::dispatch(self.request(Method::GET, path, token)?).await
    }

    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &[&str],
        body: &TReq,
        token: &str,
    ) -> FeedClientResult<TRes>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        Self::dispatch(self.request(method, path, Some(token))?.json(body)).await
    }

    async fn send_empty<TRes>(
        &self,
        method: Method,
        path: &[&str],
        token: &str,
    ) -> FeedClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        Self::dispatch(self.request(method, path, Some(token))?).await
    }

    /// Лента постов, новые сверху.
    pub(crate) async fn list_posts(
        &self,
        token: Option<&str>,
        limit: Option<u32>,
    ) -> FeedClientResult<Vec<Post>> {
        let request = self
            .request(Method::GET, &["api", "posts"], token)?
            .query(&FeedQuery { limit });
        let dtos: Vec<PostDto> = Self::dispatch(request).await?;
        Ok(dtos.into_iter().map(Post::from).collect())
    }

    pub(crate) async fn get_post(&self, token: Option<&str>, id: &str) -> FeedClientResult<Post> {
        let dto: PostDto = self.get_json(&["api", "posts", id], token).await?;
        Ok(dto.into())
    }

    pub(crate) async fn create_post(
        &self,
        token: &str,
        content: &str,
        image: Option<&str>,
    ) -> FeedClientResult<MutationResult> {
        let payload = CreatePostRequestDto { content, image };
        self.send_json(Method::POST, &["api", "posts"], &payload, token)
            .await
    }

    pub(crate) async fn toggle_like(&self, token: &str, id: &str) -> FeedClientResult<MutationResult> {
        self.send_empty(Method::POST, &["api", "posts", id, "like"], token)
            .await
    }

    pub(crate) async fn toggle_bookmark(
        &self,
        token: &str,
        id: &str,
    ) -> FeedClientResult<MutationResult> {
        self.send_empty(Method::POST, &["api", "posts", id, "bookmark"], token)
            .await
    }

    pub(crate) async fn create_comment(
        &self,
        token: &str,
        id: &str,
        content: &str,
    ) -> FeedClientResult<MutationResult> {
        let payload = ContentRequestDto { content };
        self.send_json(
            Method::POST,
            &["api", "posts", id, "comments"],
            &payload,
            token,
        )
        .await
    }

    pub(crate) async fn update_post(
        &self,
        token: &str,
        id: &str,
        content: &str,
    ) -> FeedClientResult<MutationResult> {
        let payload = ContentRequestDto { content };
        self.send_json(Method::PUT, &["api", "posts", id], &payload, token)
            .await
    }

    pub(crate) async fn delete_post(&self, token: &str, id: &str) -> FeedClientResult<MutationResult> {
        self.send_empty(Method::DELETE, &["api", "posts", id], token)
            .await
    }

    pub(crate) async fn current_viewer(&self, token: &str) -> FeedClientResult<Viewer> {
        self.get_json(&["api", "me"], Some(token)).await
    }

    pub(crate) async fn get_profile(
        &self,
        token: Option<&str>,
        username: &str,
    ) -> FeedClientResult<Profile> {
        self.get_json(&["api", "profiles", username], token)
            .await
    }

    /// `collection`: `posts`, `liked` или `bookmarks`.
    pub(crate) async fn user_posts(
        &self,
        token: Option<&str>,
        user_id: &str,
        collection: &str,
    ) -> FeedClientResult<Vec<Post>> {
        let dtos: Vec<PostDto> = self
            .get_json(&["api", "users", user_id, collection], token)
            .await?;
        Ok(dtos.into_iter().map(Post::from).collect())
    }

    pub(crate) async fn is_following(&self, token: &str, user_id: &str) -> FeedClientResult<bool> {
        let dto: FollowStatusDto = self
            .get_json(&["api", "users", user_id, "follow"], Some(token))
            .await?;
        Ok(dto.following)
    }

    pub(crate) async fn toggle_follow(
        &self,
        token: &str,
        user_id: &str,
    ) -> FeedClientResult<MutationResult> {
        self.send_empty(Method::POST, &["api", "users", user_id, "follow"], token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = HttpClient::new(HttpConfig::new("http://localhost:3000/"))
            .expect("client must build");
        let full = client.endpoint(&["api", "posts"]).expect("valid segments");
        assert_eq!(full.as_str(), "http://localhost:3000/api/posts");

        let nested = HttpClient::new(HttpConfig::new("http://localhost:3000/feed/"))
            .expect("client must build");
        let full = nested.endpoint(&["api", "me"]).expect("valid segments");
        assert_eq!(full.as_str(), "http://localhost:3000/feed/api/me");
    }

    #[test]
    fn endpoint_escapes_reserved_characters_inside_segment() {
        let client = HttpClient::new(HttpConfig::new("http://localhost:3000"))
            .expect("client must build");

        let full = client
            .endpoint(&["api", "posts", "p1?evil=1#x"])
            .expect("valid segments");
        assert_eq!(full.path(), "/api/posts/p1%3Fevil=1%23x");
        assert_eq!(full.query(), None);

        let full = client
            .endpoint(&["api", "posts", "p1/../p1"])
            .expect("valid segments");
        assert_eq!(full.path(), "/api/posts/p1%2F..%2Fp1");
    }

    #[test]
    fn endpoint_rejects_dot_and_empty_segments() {
        let client = HttpClient::new(HttpConfig::new("http://localhost:3000"))
            .expect("client must build");

        for bad in ["", ".", ".."] {
            let err = client
                .endpoint(&["api", "posts", bad])
                .expect_err("segment must be rejected");
            assert!(matches!(err, FeedClientError::InvalidRequest(_)));
        }
    }

    #[test]
    fn new_rejects_blank_base_url() {
        let err = HttpClient::new(HttpConfig::new("   ")).expect_err("blank url must fail");
        assert!(matches!(err, FeedClientError::InvalidConfig(_)));

        let err = HttpClient::new(HttpConfig::new("not a url")).expect_err("garbage must fail");
        assert!(matches!(err, FeedClientError::InvalidConfig(_)));
    }

    #[test]
    fn post_dto_reads_like_count_from_count_object() {
        let raw = r#"{
            "id": "p1",
            "content": "hello",
            "image": null,
            "created_at": "2026-01-01T00:00:00Z",
            "author": {"id": "u1", "username": "ann", "name": "Ann", "image": null},
            "likes": [{"post_id": "p1", "user_id": "u2"}],
            "_count": {"likes": 1}
        }"#;

        let dto: PostDto = serde_json::from_str(raw).expect("dto must parse");
        let post = Post::from(dto);
        assert_eq!(post.like_count, 1);
        assert!(post.liked_by("u2"));
        assert!(post.bookmarks.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn post_dto_clamps_negative_like_count() {
        let raw = r#"{
            "id": "p1",
            "content": null,
            "image": "https://img.example/1.png",
            "created_at": "2026-01-01T00:00:00Z",
            "author": {"id": "u1", "username": "ann", "name": null, "image": null},
            "_count": {"likes": -3}
        }"#;

        let dto: PostDto = serde_json::from_str(raw).expect("dto must parse");
        let post = Post::from(dto);
        assert_eq!(post.like_count, 0);
        assert_eq!(post.image.as_deref(), Some("https://img.example/1.png"));
    }

    #[test]
    fn feed_query_omits_missing_limit() {
        let raw = serde_json::to_string(&FeedQuery { limit: None }).expect("serializable");
        assert_eq!(raw, "{}");
    }
}
