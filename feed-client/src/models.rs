use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Краткая карточка автора поста или комментария.
pub struct Author {
    /// Идентификатор пользователя.
    pub id: String,
    /// Логин (используется в ссылке на профиль).
    pub username: String,
    /// Отображаемое имя.
    pub name: Option<String>,
    /// URL аватара.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Лайк: не больше одного на пару (пост, пользователь).
pub struct Like {
    /// Идентификатор поста.
    pub post_id: String,
    /// Идентификатор пользователя.
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Закладка: не больше одной на пару (пост, пользователь).
pub struct Bookmark {
    /// Идентификатор поста.
    pub post_id: String,
    /// Идентификатор пользователя.
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: String,
    /// Идентификатор поста.
    pub post_id: String,
    /// Автор комментария.
    pub author: Author,
    /// Текст.
    pub content: String,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Пост ленты вместе с лайками, закладками и комментариями.
pub struct Post {
    /// Идентификатор поста.
    pub id: String,
    /// Текст поста.
    pub content: Option<String>,
    /// URL картинки.
    pub image: Option<String>,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Автор поста.
    pub author: Author,
    /// Лайки.
    pub likes: Vec<Like>,
    /// Закладки.
    pub bookmarks: Vec<Bookmark>,
    /// Комментарии в порядке создания.
    pub comments: Vec<Comment>,
    /// Денормализованное число лайков.
    pub like_count: i64,
}

impl Post {
    /// Есть ли лайк пользователя `user_id` среди лайков поста.
    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    /// Есть ли закладка пользователя `user_id`.
    pub fn bookmarked_by(&self, user_id: &str) -> bool {
        self.bookmarks
            .iter()
            .any(|bookmark| bookmark.user_id == user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Текущий пользователь. `user_id == None` означает анонимного зрителя.
pub struct Viewer {
    /// Идентификатор пользователя в базе.
    pub user_id: Option<String>,
}

impl Viewer {
    /// Анонимный зритель.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// Авторизованный зритель.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// Авторизован ли зритель.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Совпадает ли зритель с пользователем `user_id`.
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Профиль пользователя.
pub struct Profile {
    /// Идентификатор пользователя.
    pub id: String,
    /// Логин.
    pub username: String,
    /// Отображаемое имя.
    pub name: Option<String>,
    /// О себе.
    pub bio: Option<String>,
    /// URL аватара.
    pub image: Option<String>,
    /// Местоположение.
    pub location: Option<String>,
    /// Сайт.
    pub website: Option<String>,
    /// Дата регистрации (UTC).
    pub created_at: DateTime<Utc>,
    /// Число подписчиков.
    pub followers: u64,
    /// Число подписок.
    pub following: u64,
    /// Число постов.
    pub posts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Ответ серверной мутации: флаг успеха и необязательная причина отказа.
pub struct MutationResult {
    /// Признак успеха.
    pub success: bool,
    /// Причина отказа, если сервер её сообщил.
    #[serde(default)]
    pub error: Option<String>,
}

impl MutationResult {
    /// Успешный результат.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Отказ с необязательной причиной.
    pub fn refused(reason: Option<&str>) -> Self {
        Self {
            success: false,
            error: reason.map(str::to_string),
        }
    }
}
