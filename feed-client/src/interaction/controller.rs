use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use super::notify::{Notification, Notifier};
use super::state::{InteractionKind, InteractionSnapshot, InteractionState, MutationPhase};
use crate::error::{FeedClientError, FeedClientResult};
use crate::models::{Comment, MutationResult, Post, Viewer};
use crate::mutations::PostMutations;

const LIKE_FAILED: &str = "Failed to update like";
const BOOKMARK_FAILED: &str = "Failed to update bookmark";
const COMMENT_POSTED: &str = "Comment posted successfully";
const COMMENT_FAILED: &str = "Failed to add comment";
const POST_UPDATED: &str = "Post updated successfully";
const UPDATE_FAILED: &str = "Failed to update post";
const UPDATE_CRASHED: &str = "An unexpected error occurred.";
const POST_DELETED: &str = "Post deleted successfully";
const DELETE_FAILED: &str = "Failed to delete post";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Итог операции контроллера.
pub enum Outcome {
    /// Операция не выполнялась: пустой ввод, нет прав или мутация этого вида
    /// уже идёт.
    Skipped,
    /// Сервер подтвердил мутацию.
    Committed,
    /// Мутация не удалась, оптимистичное состояние откатено.
    RolledBack,
    /// Мутация завершилась после `dispose`, её результат отброшен.
    Discarded,
}

#[derive(Debug, Error)]
/// Ошибка удаления поста, которую контроллер отдаёт вызывающей стороне.
pub enum InteractionError {
    /// Сервер отказал в удалении.
    #[error("{reason}")]
    Rejected {
        /// Причина от сервера или общее сообщение.
        reason: String,
    },

    /// Сбой транспорта или сервера.
    #[error("transport failure: {0}")]
    Transport(#[from] FeedClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Что зритель может делать с постом.
pub struct Capabilities {
    /// Лайк, закладка, комментарий: нужен вход.
    pub can_interact: bool,
    /// Правка и удаление: только автор поста.
    pub can_manage: bool,
}

enum Resolution {
    Accepted,
    Refused(Option<String>),
    Failed(FeedClientError),
}

impl From<FeedClientResult<MutationResult>> for Resolution {
    fn from(result: FeedClientResult<MutationResult>) -> Self {
        match result {
            Ok(MutationResult { success: true, .. }) => Self::Accepted,
            Ok(MutationResult { error, .. }) => Self::Refused(error.filter(|e| !e.trim().is_empty())),
            Err(err) => Self::Failed(err),
        }
    }
}

struct Inner<M, N> {
    post_id: String,
    author_id: String,
    viewer: Viewer,
    mutations: M,
    notifier: N,
    state: Mutex<InteractionState>,
    disposed: AtomicBool,
}

impl<M, N> Inner<M, N> {
    fn lock_state(&self) -> MutexGuard<'_, InteractionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Состояние для применения результата мутации; `None` после `dispose`.
    fn live_state(&self) -> Option<MutexGuard<'_, InteractionState>> {
        if self.disposed.load(Ordering::Acquire) {
            return None;
        }
        Some(self.lock_state())
    }
}

impl<M, N: Notifier> Inner<M, N> {
    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

/// Снимает `Pending`, если операция закончилась, не применив результат:
/// future бросили (`timeout`, `select!`, `abort`) или результат отброшен
/// после `dispose`. Оптимистичные лайк и закладка при этом откатываются.
struct PendingGuard<'a, M, N> {
    inner: &'a Inner<M, N>,
    kind: InteractionKind,
    armed: bool,
}

impl<'a, M, N> PendingGuard<'a, M, N> {
    fn new(inner: &'a Inner<M, N>, kind: InteractionKind) -> Self {
        Self {
            inner,
            kind,
            armed: true,
        }
    }

    /// Результат применён вызывающим кодом.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<M, N> Drop for PendingGuard<'_, M, N> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.lock_state();
        if !self.inner.disposed.load(Ordering::Acquire) {
            match self.kind {
                InteractionKind::Like => state.rollback_like(),
                InteractionKind::Bookmark => state.rollback_bookmark(),
                _ => {}
            }
            debug!(post_id = %self.inner.post_id, kind = ?self.kind, "mutation abandoned before resolution");
        }
        state.finish(self.kind, false);
    }
}

/// Контроллер оптимистичных взаимодействий с одним постом.
///
/// Держит локальную копию состояния поста для отображения и согласует её с
/// результатами асинхронных мутаций. Дешёво клонируется: клоны делят одно
/// состояние, поэтому операцию можно запустить в отдельной задаче и
/// наблюдать оптимистичное состояние до её завершения.
///
/// На каждый вид взаимодействия одновременно выполняется не больше одной
/// мутации; повторный вызов того же вида до завершения игнорируется. Разные
/// виды друг друга не ждут.
pub struct PostInteractions<M, N> {
    inner: Arc<Inner<M, N>>,
}

impl<M, N> Clone for PostInteractions<M, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, N> PostInteractions<M, N>
where
    M: PostMutations,
    N: Notifier,
{
    /// Создаёт контроллер из авторитетной копии поста.
    pub fn new(post: &Post, viewer: Viewer, mutations: M, notifier: N) -> Self {
        let state = InteractionState::from_post(post, &viewer);
        Self {
            inner: Arc::new(Inner {
                post_id: post.id.clone(),
                author_id: post.author.id.clone(),
                viewer,
                mutations,
                notifier,
                state: Mutex::new(state),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Идентификатор поста.
    pub fn post_id(&self) -> &str {
        &self.inner.post_id
    }

    /// Права зрителя на этот пост.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_interact: self.inner.viewer.is_authenticated(),
            can_manage: self.inner.viewer.is(&self.inner.author_id),
        }
    }

    /// Копия текущего отображаемого состояния.
    pub fn snapshot(&self) -> InteractionSnapshot {
        self.inner.lock_state().snapshot()
    }

    /// Фаза автомата для вида взаимодействия.
    pub fn phase(&self, kind: InteractionKind) -> MutationPhase {
        self.inner.lock_state().phase(kind)
    }

    /// Комментарии из последнего авторитетного чтения.
    pub fn comments(&self) -> Vec<Comment> {
        self.inner.lock_state().comments().to_vec()
    }

    /// Заменяет черновик комментария.
    pub fn set_comment_draft(&self, text: impl Into<String>) {
        self.inner.lock_state().set_comment_draft(text.into());
    }

    /// Заменяет буфер правки поста.
    pub fn set_edit_draft(&self, text: impl Into<String>) {
        self.inner.lock_state().set_edit_draft(text.into());
    }

    /// Раскрывает или скрывает комментарии. Возвращает новое значение.
    pub fn toggle_comments_visible(&self) -> bool {
        self.inner.lock_state().toggle_comments_visible()
    }

    /// Пересевает состояние из свежей копии поста.
    pub fn refresh(&self, post: &Post) {
        if post.id != self.inner.post_id {
            warn!(
                expected = %self.inner.post_id,
                got = %post.id,
                "refresh with a different post ignored"
            );
            return;
        }
        self.inner.lock_state().refresh(post, &self.inner.viewer);
    }

    /// Отвязывает контроллер от владельца. Мутации, завершившиеся позже, не
    /// меняют состояние и не шлют уведомлений.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
    }

    /// Был ли вызван `dispose`.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    fn begin(&self, kind: InteractionKind) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.inner.lock_state().begin(kind)
    }

    /// Переключает лайк: сразу меняет флаг и счётчик, затем отправляет
    /// мутацию. При ошибке возвращает последние подтверждённые сервером
    /// значения и шлёт уведомление об ошибке.
    pub async fn toggle_like(&self) -> Outcome {
        if !self.capabilities().can_interact {
            return Outcome::Skipped;
        }
        {
            let mut state = self.inner.lock_state();
            if self.is_disposed() || !state.begin(InteractionKind::Like) {
                return Outcome::Skipped;
            }
            state.apply_like_toggle();
            let like = state.like();
            debug!(post_id = %self.inner.post_id, liked = like.liked, count = like.count, "like toggled optimistically");
        }
        let mut pending = PendingGuard::new(&*self.inner, InteractionKind::Like);

        let resolution = Resolution::from(self.inner.mutations.toggle_like(&self.inner.post_id).await);

        let Some(mut state) = self.inner.live_state() else {
            debug!(post_id = %self.inner.post_id, "like resolution discarded");
            return Outcome::Discarded;
        };
        pending.disarm();
        match resolution {
            Resolution::Accepted => {
                state.commit_like();
                state.finish(InteractionKind::Like, true);
                Outcome::Committed
            }
            Resolution::Refused(reason) => {
                warn!(post_id = %self.inner.post_id, reason = ?reason, "like refused, rolling back");
                state.rollback_like();
                state.finish(InteractionKind::Like, false);
                drop(state);
                self.inner.notify(Notification::error(LIKE_FAILED));
                Outcome::RolledBack
            }
            Resolution::Failed(err) => {
                warn!(post_id = %self.inner.post_id, error = %err, "like failed, rolling back");
                state.rollback_like();
                state.finish(InteractionKind::Like, false);
                drop(state);
                self.inner.notify(Notification::error(LIKE_FAILED));
                Outcome::RolledBack
            }
        }
    }

    /// Переключает закладку оптимистично; при ошибке возвращает прежнее
    /// значение и шлёт ровно одно уведомление об ошибке.
    pub async fn toggle_bookmark(&self) -> Outcome {
        if !self.capabilities().can_interact {
            return Outcome::Skipped;
        }
        {
            let mut state = self.inner.lock_state();
            if self.is_disposed() || !state.begin(InteractionKind::Bookmark) {
                return Outcome::Skipped;
            }
            state.apply_bookmark_toggle();
        }
        let mut pending = PendingGuard::new(&*self.inner, InteractionKind::Bookmark);

        let resolution =
            Resolution::from(self.inner.mutations.toggle_bookmark(&self.inner.post_id).await);

        let Some(mut state) = self.inner.live_state() else {
            debug!(post_id = %self.inner.post_id, "bookmark resolution discarded");
            return Outcome::Discarded;
        };
        pending.disarm();
        if let Resolution::Accepted = resolution {
            state.commit_bookmark();
            state.finish(InteractionKind::Bookmark, true);
            return Outcome::Committed;
        }

        match &resolution {
            Resolution::Failed(err) => {
                warn!(post_id = %self.inner.post_id, error = %err, "bookmark failed, rolling back")
            }
            _ => warn!(post_id = %self.inner.post_id, "bookmark refused, rolling back"),
        }
        state.rollback_bookmark();
        state.finish(InteractionKind::Bookmark, false);
        drop(state);
        self.inner.notify(Notification::error(BOOKMARK_FAILED));
        Outcome::RolledBack
    }

    /// Отправляет комментарий. Пустой после `trim` текст игнорируется.
    ///
    /// Новый комментарий локально не добавляется: список обновится при
    /// следующем чтении поста (`refresh`). При успехе черновик очищается.
    pub async fn submit_comment(&self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() || !self.capabilities().can_interact {
            return Outcome::Skipped;
        }
        if !self.begin(InteractionKind::Comment) {
            return Outcome::Skipped;
        }
        let mut pending = PendingGuard::new(&*self.inner, InteractionKind::Comment);

        let resolution = Resolution::from(
            self.inner
                .mutations
                .create_comment(&self.inner.post_id, text)
                .await,
        );

        let Some(mut state) = self.inner.live_state() else {
            return Outcome::Discarded;
        };
        pending.disarm();
        let (committed, notification) = match resolution {
            Resolution::Accepted => {
                state.clear_comment_draft();
                (true, Notification::success(COMMENT_POSTED))
            }
            Resolution::Refused(reason) => (
                false,
                Notification::error(reason.unwrap_or_else(|| COMMENT_FAILED.to_string())),
            ),
            Resolution::Failed(err) => {
                warn!(post_id = %self.inner.post_id, error = %err, "comment failed");
                (false, Notification::error(COMMENT_FAILED))
            }
        };
        state.finish(InteractionKind::Comment, committed);
        drop(state);

        self.inner.notify(notification);
        if committed {
            Outcome::Committed
        } else {
            Outcome::RolledBack
        }
    }

    /// Заменяет текст поста. Пустой текст игнорируется; права есть только у
    /// автора. Закрыть форму правки должна вызывающая сторона.
    pub async fn submit_edit(&self, text: &str) -> Outcome {
        if text.is_empty() || !self.capabilities().can_manage {
            return Outcome::Skipped;
        }
        if !self.begin(InteractionKind::Edit) {
            return Outcome::Skipped;
        }
        let mut pending = PendingGuard::new(&*self.inner, InteractionKind::Edit);

        let resolution = Resolution::from(
            self.inner
                .mutations
                .update_post(&self.inner.post_id, text)
                .await,
        );

        let Some(mut state) = self.inner.live_state() else {
            return Outcome::Discarded;
        };
        pending.disarm();
        let (committed, notification) = match resolution {
            Resolution::Accepted => (true, Notification::success(POST_UPDATED)),
            Resolution::Refused(reason) => (
                false,
                Notification::error(reason.unwrap_or_else(|| UPDATE_FAILED.to_string())),
            ),
            Resolution::Failed(err) => {
                warn!(post_id = %self.inner.post_id, error = %err, "post update failed");
                (false, Notification::error(UPDATE_CRASHED))
            }
        };
        state.finish(InteractionKind::Edit, committed);
        drop(state);

        self.inner.notify(notification);
        if committed {
            Outcome::Committed
        } else {
            Outcome::RolledBack
        }
    }

    /// Удаляет пост. Отказ сервера или сбой транспорта возвращается
    /// вызывающей стороне как ошибка (вместе с уведомлением). Убрать пост из
    /// отображаемого списка должна вызывающая сторона.
    pub async fn submit_delete(&self) -> Result<Outcome, InteractionError> {
        if !self.capabilities().can_manage {
            return Ok(Outcome::Skipped);
        }
        if !self.begin(InteractionKind::Delete) {
            return Ok(Outcome::Skipped);
        }
        let mut pending = PendingGuard::new(&*self.inner, InteractionKind::Delete);

        let resolution =
            Resolution::from(self.inner.mutations.delete_post(&self.inner.post_id).await);

        let Some(mut state) = self.inner.live_state() else {
            return Ok(Outcome::Discarded);
        };
        pending.disarm();
        let committed = matches!(resolution, Resolution::Accepted);
        state.finish(InteractionKind::Delete, committed);
        drop(state);

        match resolution {
            Resolution::Accepted => {
                self.inner.notify(Notification::success(POST_DELETED));
                Ok(Outcome::Committed)
            }
            Resolution::Refused(reason) => {
                let reason = reason.unwrap_or_else(|| DELETE_FAILED.to_string());
                warn!(post_id = %self.inner.post_id, reason = %reason, "post delete refused");
                self.inner.notify(Notification::error(DELETE_FAILED));
                Err(InteractionError::Rejected { reason })
            }
            Resolution::Failed(err) => {
                warn!(post_id = %self.inner.post_id, error = %err, "post delete failed");
                self.inner.notify(Notification::error(DELETE_FAILED));
                Err(InteractionError::Transport(err))
            }
        }
    }
}
