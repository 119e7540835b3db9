use crate::models::{Comment, Post, Viewer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Вид взаимодействия с постом. У каждого вида свой автомат состояний.
pub enum InteractionKind {
    /// Лайк.
    Like,
    /// Закладка.
    Bookmark,
    /// Новый комментарий.
    Comment,
    /// Правка текста поста.
    Edit,
    /// Удаление поста.
    Delete,
}

impl InteractionKind {
    fn index(self) -> usize {
        match self {
            Self::Like => 0,
            Self::Bookmark => 1,
            Self::Comment => 2,
            Self::Edit => 3,
            Self::Delete => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Фаза мутации: `Idle → Pending → {Committed, RolledBack}`.
pub enum MutationPhase {
    /// Мутаций этого вида ещё не было.
    #[default]
    Idle,
    /// Мутация отправлена и ещё не завершилась.
    Pending,
    /// Последняя мутация подтверждена сервером.
    Committed,
    /// Последняя мутация не удалась, состояние откатено.
    RolledBack,
}

impl MutationPhase {
    /// Выполняется ли сейчас мутация.
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Флаги выполняющихся мутаций по видам.
pub struct InFlight {
    /// Лайк.
    pub liking: bool,
    /// Закладка.
    pub bookmarking: bool,
    /// Комментарий.
    pub commenting: bool,
    /// Правка.
    pub editing: bool,
    /// Удаление.
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Копия отображаемого состояния контроллера.
pub struct InteractionSnapshot {
    /// Лайкнул ли зритель пост (с учётом оптимистичного изменения).
    pub liked: bool,
    /// Число лайков (с учётом оптимистичного изменения).
    pub like_count: i64,
    /// В закладках ли пост.
    pub bookmarked: bool,
    /// Раскрыт ли блок комментариев.
    pub comments_visible: bool,
    /// Черновик комментария.
    pub comment_draft: String,
    /// Буфер правки текста поста.
    pub edit_draft: String,
    /// Число комментариев из последнего авторитетного чтения.
    pub comment_count: usize,
    /// Выполняющиеся мутации.
    pub in_flight: InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LikeState {
    pub(crate) liked: bool,
    pub(crate) count: i64,
}

impl LikeState {
    fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: (self.count - 1).max(0),
            }
        } else {
            Self {
                liked: true,
                count: self.count + 1,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InteractionState {
    like: LikeState,
    // last state the server is known to hold
    confirmed_like: LikeState,
    bookmarked: bool,
    confirmed_bookmarked: bool,
    comments: Vec<Comment>,
    comments_visible: bool,
    comment_draft: String,
    edit_draft: String,
    phases: [MutationPhase; 5],
}

impl InteractionState {
    pub(crate) fn from_post(post: &Post, viewer: &Viewer) -> Self {
        let like = LikeState {
            liked: viewer.user_id.as_deref().is_some_and(|id| post.liked_by(id)),
            count: post.like_count.max(0),
        };
        let bookmarked = viewer
            .user_id
            .as_deref()
            .is_some_and(|id| post.bookmarked_by(id));

        Self {
            like,
            confirmed_like: like,
            bookmarked,
            confirmed_bookmarked: bookmarked,
            comments: post.comments.clone(),
            comments_visible: false,
            comment_draft: String::new(),
            edit_draft: post.content.clone().unwrap_or_default(),
            phases: [MutationPhase::Idle; 5],
        }
    }

    pub(crate) fn phase(&self, kind: InteractionKind) -> MutationPhase {
        self.phases[kind.index()]
    }

    /// Переводит вид в `Pending`. `false`, если мутация этого вида уже идёт.
    pub(crate) fn begin(&mut self, kind: InteractionKind) -> bool {
        let phase = &mut self.phases[kind.index()];
        if phase.is_pending() {
            return false;
        }
        *phase = MutationPhase::Pending;
        true
    }

    pub(crate) fn finish(&mut self, kind: InteractionKind, committed: bool) {
        self.phases[kind.index()] = if committed {
            MutationPhase::Committed
        } else {
            MutationPhase::RolledBack
        };
    }

    pub(crate) fn like(&self) -> LikeState {
        self.like
    }

    pub(crate) fn apply_like_toggle(&mut self) {
        self.like = self.like.toggled();
    }

    pub(crate) fn commit_like(&mut self) {
        self.confirmed_like = self.like;
    }

    pub(crate) fn rollback_like(&mut self) {
        self.like = self.confirmed_like;
    }

    pub(crate) fn apply_bookmark_toggle(&mut self) {
        self.bookmarked = !self.bookmarked;
    }

    pub(crate) fn commit_bookmark(&mut self) {
        self.confirmed_bookmarked = self.bookmarked;
    }

    pub(crate) fn rollback_bookmark(&mut self) {
        self.bookmarked = self.confirmed_bookmarked;
    }

    pub(crate) fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub(crate) fn toggle_comments_visible(&mut self) -> bool {
        self.comments_visible = !self.comments_visible;
        self.comments_visible
    }

    pub(crate) fn set_comment_draft(&mut self, text: String) {
        self.comment_draft = text;
    }

    pub(crate) fn clear_comment_draft(&mut self) {
        self.comment_draft.clear();
    }

    pub(crate) fn set_edit_draft(&mut self, text: String) {
        self.edit_draft = text;
    }

    /// Пересев из свежего чтения. Виды в `Pending` сохраняют оптимистичные
    /// значения: их судьбу решит завершение мутации.
    pub(crate) fn refresh(&mut self, post: &Post, viewer: &Viewer) {
        let fresh = Self::from_post(post, viewer);

        self.confirmed_like = fresh.like;
        if !self.phase(InteractionKind::Like).is_pending() {
            self.like = fresh.like;
        }

        self.confirmed_bookmarked = fresh.bookmarked;
        if !self.phase(InteractionKind::Bookmark).is_pending() {
            self.bookmarked = fresh.bookmarked;
        }

        self.comments = fresh.comments;
    }

    pub(crate) fn snapshot(&self) -> InteractionSnapshot {
        InteractionSnapshot {
            liked: self.like.liked,
            like_count: self.like.count,
            bookmarked: self.bookmarked,
            comments_visible: self.comments_visible,
            comment_draft: self.comment_draft.clone(),
            edit_draft: self.edit_draft.clone(),
            comment_count: self.comments.len(),
            in_flight: InFlight {
                liking: self.phase(InteractionKind::Like).is_pending(),
                bookmarking: self.phase(InteractionKind::Bookmark).is_pending(),
                commenting: self.phase(InteractionKind::Comment).is_pending(),
                editing: self.phase(InteractionKind::Edit).is_pending(),
                deleting: self.phase(InteractionKind::Delete).is_pending(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Author, Bookmark, Like};

    fn sample_post(like_count: i64, likers: &[&str], bookmarkers: &[&str]) -> Post {
        Post {
            id: "p1".to_string(),
            content: Some("hello".to_string()),
            image: None,
            created_at: Utc::now(),
            author: Author {
                id: "author".to_string(),
                username: "author".to_string(),
                name: None,
                image: None,
            },
            likes: likers
                .iter()
                .map(|user| Like {
                    post_id: "p1".to_string(),
                    user_id: user.to_string(),
                })
                .collect(),
            bookmarks: bookmarkers
                .iter()
                .map(|user| Bookmark {
                    post_id: "p1".to_string(),
                    user_id: user.to_string(),
                })
                .collect(),
            comments: Vec::new(),
            like_count,
        }
    }

    #[test]
    fn from_post_seeds_flags_from_viewer_membership() {
        let post = sample_post(2, &["u1", "u2"], &["u1"]);

        let state = InteractionState::from_post(&post, &Viewer::signed_in("u1"));
        let snapshot = state.snapshot();
        assert!(snapshot.liked);
        assert!(snapshot.bookmarked);
        assert_eq!(snapshot.like_count, 2);
        assert_eq!(snapshot.edit_draft, "hello");
        assert_eq!(snapshot.in_flight, InFlight::default());

        let anonymous = InteractionState::from_post(&post, &Viewer::anonymous()).snapshot();
        assert!(!anonymous.liked);
        assert!(!anonymous.bookmarked);
        assert_eq!(anonymous.like_count, 2);
    }

    #[test]
    fn begin_refuses_second_pending_of_same_kind_only() {
        let mut state = InteractionState::from_post(&sample_post(0, &[], &[]), &Viewer::anonymous());

        assert!(state.begin(InteractionKind::Like));
        assert!(!state.begin(InteractionKind::Like));
        assert!(state.begin(InteractionKind::Bookmark));

        let in_flight = state.snapshot().in_flight;
        assert!(in_flight.liking);
        assert!(in_flight.bookmarking);
        assert!(!in_flight.commenting);

        state.finish(InteractionKind::Like, false);
        assert_eq!(state.phase(InteractionKind::Like), MutationPhase::RolledBack);
        assert!(state.begin(InteractionKind::Like));
    }

    #[test]
    fn like_toggle_never_drops_count_below_zero() {
        let mut state =
            InteractionState::from_post(&sample_post(0, &["u1"], &[]), &Viewer::signed_in("u1"));

        state.apply_like_toggle();
        assert_eq!(state.like(), LikeState { liked: false, count: 0 });
    }

    #[test]
    fn rollback_like_returns_to_last_committed_values() {
        let mut state =
            InteractionState::from_post(&sample_post(5, &[], &[]), &Viewer::signed_in("u1"));

        state.apply_like_toggle();
        state.commit_like();
        state.apply_like_toggle();
        state.rollback_like();

        assert_eq!(state.like(), LikeState { liked: true, count: 6 });
    }

    #[test]
    fn refresh_keeps_pending_like_but_replaces_bookmark_and_comments() {
        let mut state =
            InteractionState::from_post(&sample_post(1, &[], &[]), &Viewer::signed_in("u1"));
        assert!(state.begin(InteractionKind::Like));
        state.apply_like_toggle();

        let mut fresh = sample_post(7, &[], &["u1"]);
        fresh.comments.push(Comment {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            author: fresh.author.clone(),
            content: "first".to_string(),
            created_at: Utc::now(),
        });
        state.refresh(&fresh, &Viewer::signed_in("u1"));

        let snapshot = state.snapshot();
        assert!(snapshot.liked);
        assert_eq!(snapshot.like_count, 2);
        assert!(snapshot.bookmarked);
        assert_eq!(snapshot.comment_count, 1);

        state.rollback_like();
        assert_eq!(state.like(), LikeState { liked: false, count: 7 });
    }
}
