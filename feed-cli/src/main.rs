use std::fs;
use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use feed_client::interaction::{
    ChannelNotifier, InteractionError, InteractionSnapshot, Notification, NotificationLevel,
    Outcome, PostInteractions,
};
use feed_client::{FeedClient, FeedClientError, Post, Profile};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

mod logging;
mod settings;

use logging::init_logging;
use settings::Settings;

type Interactions = PostInteractions<FeedClient, ChannelNotifier>;

#[derive(Debug, Parser)]
#[command(name = "feed-cli", version, about = "CLI клиент социальной ленты")]
struct Cli {
    /// Адрес API (по умолчанию FEED_HTTP_URL или http://127.0.0.1:3000).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Лента постов.
    Feed {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Пост с комментариями.
    Show {
        #[arg(long)]
        id: String,
    },
    /// Создание поста (требует токен).
    Post {
        #[arg(long)]
        content: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Поставить или снять лайк.
    Like {
        #[arg(long)]
        id: String,
    },
    /// Добавить в закладки или убрать.
    Bookmark {
        #[arg(long)]
        id: String,
    },
    /// Комментарий к посту.
    Comment {
        #[arg(long)]
        id: String,
        #[arg(long)]
        text: String,
    },
    /// Правка текста своего поста.
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: String,
    },
    /// Удаление своего поста.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Профиль пользователя: посты, лайки, закладки.
    Profile {
        #[arg(long)]
        username: String,
    },
    /// Подписаться на пользователя или отписаться.
    Follow {
        #[arg(long)]
        username: String,
    },
    /// Сохранить токен сессии, выданный провайдером входа.
    Token {
        #[arg(long)]
        value: String,
    },
    /// Удалить сохранённый токен.
    Logout,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let mut client = FeedClient::new(settings.http_config(cli.server))
        .map_err(map_client_error)?;

    if let Some(token) = load_token(&settings.token_file)
        .with_context(|| format!("не удалось прочитать {}", settings.token_file))?
    {
        client.set_token(token);
    }

    match cli.command {
        Command::Feed { limit } => {
            let posts = client.list_posts(limit).await.map_err(map_client_error)?;
            print_feed(&posts, Utc::now());
        }
        Command::Show { id } => {
            let (post, ctl, _toasts) = open_post(&client, &id).await?;
            print_post(&post, &ctl.snapshot(), Utc::now());
            print_comments(&post, Utc::now());
        }
        Command::Post { content, image } => {
            let result = client
                .create_post(&content, image.as_deref())
                .await
                .map_err(map_client_error)?;
            if result.success {
                println!("Пост создан");
            } else {
                anyhow::bail!(
                    "сервер отказал: {}",
                    result.error.unwrap_or_else(|| "Failed to create post".to_string())
                );
            }
        }
        Command::Like { id } => {
            let (_, ctl, toasts) = open_post(&client, &id).await?;
            let outcome = ctl.toggle_like().await;
            report(&ctl, outcome, toasts);
        }
        Command::Bookmark { id } => {
            let (_, ctl, toasts) = open_post(&client, &id).await?;
            let outcome = ctl.toggle_bookmark().await;
            report(&ctl, outcome, toasts);
        }
        Command::Comment { id, text } => {
            let (_, ctl, toasts) = open_post(&client, &id).await?;
            ctl.set_comment_draft(text.clone());
            let outcome = ctl.submit_comment(&text).await;
            report(&ctl, outcome, toasts);
        }
        Command::Edit { id, content } => {
            let (_, ctl, toasts) = open_post(&client, &id).await?;
            ctl.set_edit_draft(content.clone());
            let outcome = ctl.submit_edit(&content).await;
            report(&ctl, outcome, toasts);
        }
        Command::Delete { id } => {
            let (_, ctl, mut toasts) = open_post(&client, &id).await?;
            let result = ctl.submit_delete().await;
            print_toasts(&mut toasts);
            match result {
                Ok(Outcome::Committed) => println!("Пост удалён: id={id}"),
                Ok(outcome) => println!("{}", describe_outcome(outcome)),
                Err(InteractionError::Rejected { reason }) => {
                    anyhow::bail!("пост не удалён: {reason}")
                }
                Err(InteractionError::Transport(err)) => return Err(map_client_error(err)),
            }
        }
        Command::Profile { username } => {
            let profile = client
                .get_profile(&username)
                .await
                .map_err(map_client_error)?;
            let (posts, liked, bookmarked, following) = tokio::try_join!(
                client.user_posts(&profile.id),
                client.user_liked_posts(&profile.id),
                client.user_bookmarked_posts(&profile.id),
                client.is_following(&profile.id),
            )
            .map_err(map_client_error)?;

            let now = Utc::now();
            print_profile(&profile, following);
            println!("\nПосты:");
            print_feed(&posts, now);
            println!("\nЛайки:");
            print_feed(&liked, now);
            println!("\nЗакладки:");
            print_feed(&bookmarked, now);
        }
        Command::Follow { username } => {
            let profile = client
                .get_profile(&username)
                .await
                .map_err(map_client_error)?;
            let result = client
                .toggle_follow(&profile.id)
                .await
                .map_err(map_client_error)?;
            if !result.success {
                anyhow::bail!(
                    "сервер отказал: {}",
                    result.error.unwrap_or_else(|| "Failed to follow user".to_string())
                );
            }
            let following = client
                .is_following(&profile.id)
                .await
                .map_err(map_client_error)?;
            println!(
                "{}: @{}",
                if following { "Подписка оформлена" } else { "Подписка отменена" },
                profile.username
            );
        }
        Command::Token { value } => {
            let token = parse_token_content(&value)
                .ok_or_else(|| anyhow::anyhow!("токен не должен быть пустым"))?;
            fs::write(&settings.token_file, token).context("не удалось сохранить токен")?;
            println!("Токен сохранён в {}", settings.token_file);
        }
        Command::Logout => {
            remove_token(&settings.token_file).context("не удалось удалить токен")?;
            println!("Токен удалён");
        }
    }

    Ok(())
}

async fn open_post(
    client: &FeedClient,
    id: &str,
) -> Result<(Post, Interactions, UnboundedReceiver<Notification>)> {
    let viewer = client.current_viewer().await.map_err(map_client_error)?;
    let post = client.get_post(id).await.map_err(map_client_error)?;
    debug!(post_id = %post.id, authenticated = viewer.is_authenticated(), "post loaded");

    let (notifier, toasts) = ChannelNotifier::channel();
    let ctl = PostInteractions::new(&post, viewer, client.clone(), notifier);
    Ok((post, ctl, toasts))
}

fn report(ctl: &Interactions, outcome: Outcome, mut toasts: UnboundedReceiver<Notification>) {
    print_toasts(&mut toasts);
    if outcome == Outcome::Skipped && !ctl.capabilities().can_interact {
        println!("требуется вход: выполните `feed-cli token --value ...`");
        return;
    }
    println!("{}", describe_outcome(outcome));
    println!("{}", format_counters(&ctl.snapshot()));
}

fn print_toasts(toasts: &mut UnboundedReceiver<Notification>) {
    while let Ok(toast) = toasts.try_recv() {
        let marker = match toast.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Error => "✗",
        };
        println!("{marker} {}", toast.message);
    }
}

fn describe_outcome(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Skipped => "операция пропущена",
        Outcome::Committed => "готово",
        Outcome::RolledBack => "изменение отменено",
        Outcome::Discarded => "результат отброшен",
    }
}

fn format_counters(snapshot: &InteractionSnapshot) -> String {
    format!(
        "{} {}  💬 {}  {}",
        if snapshot.liked { "♥" } else { "♡" },
        snapshot.like_count,
        snapshot.comment_count,
        if snapshot.bookmarked { "[в закладках]" } else { "" }
    )
    .trim_end()
    .to_string()
}

fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);
    if age.num_minutes() < 1 {
        "только что".to_string()
    } else if age.num_hours() < 1 {
        format!("{} мин назад", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{} ч назад", age.num_hours())
    } else {
        format!("{} дн назад", age.num_days())
    }
}

fn display_name(post: &Post) -> &str {
    post.author
        .name
        .as_deref()
        .unwrap_or(post.author.username.as_str())
}

fn print_post(post: &Post, snapshot: &InteractionSnapshot, now: DateTime<Utc>) {
    println!(
        "{} (@{}) · {}",
        display_name(post),
        post.author.username,
        format_age(post.created_at, now)
    );
    println!("id: {}", post.id);
    if let Some(image) = &post.image {
        println!("image: {image}");
    }
    if let Some(content) = &post.content {
        println!("{content}");
    }
    println!("{}", format_counters(snapshot));
}

fn print_comments(post: &Post, now: DateTime<Utc>) {
    if post.comments.is_empty() {
        println!("Комментариев нет");
        return;
    }
    for comment in &post.comments {
        println!(
            "  {} · {}: {}",
            comment.author.name.as_deref().unwrap_or(&comment.author.username),
            format_age(comment.created_at, now),
            comment.content
        );
    }
}

fn print_feed(posts: &[Post], now: DateTime<Utc>) {
    if posts.is_empty() {
        println!("(пусто)");
        return;
    }
    for post in posts {
        println!(
            "- [{}] {}: {} (♥ {}, 💬 {}, {})",
            post.id,
            display_name(post),
            post.content.as_deref().unwrap_or("<изображение>"),
            post.like_count,
            post.comments.len(),
            format_age(post.created_at, now)
        );
    }
}

fn print_profile(profile: &Profile, following: bool) {
    println!(
        "{} (@{})",
        profile.name.as_deref().unwrap_or(&profile.username),
        profile.username
    );
    if let Some(bio) = &profile.bio {
        println!("{bio}");
    }
    if let Some(location) = &profile.location {
        println!("location: {location}");
    }
    if let Some(website) = &profile.website {
        println!("website: {website}");
    }
    println!(
        "posts: {}, followers: {}, following: {}",
        profile.posts, profile.followers, profile.following
    );
    println!("joined: {}", profile.created_at.format("%B %Y"));
    if following {
        println!("вы подписаны");
    }
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token(path: &str) -> io::Result<Option<String>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    Ok(parse_token_content(&raw))
}

fn remove_token(path: &str) -> io::Result<()> {
    if Path::new(path).exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn map_client_error(err: FeedClientError) -> anyhow::Error {
    let message = match err {
        FeedClientError::Unauthorized => {
            "требуется авторизация: выполните `feed-cli token --value ...`".to_string()
        }
        FeedClientError::NotFound => "ресурс не найден".to_string(),
        FeedClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        FeedClientError::Server { status, message } => {
            format!("ошибка сервера {status}: {message}")
        }
        FeedClientError::Http(err) => format!("ошибка HTTP: {err}"),
        FeedClientError::InvalidConfig(message) => format!("некорректная конфигурация: {message}"),
    };
    anyhow::anyhow!(message)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn snapshot(liked: bool, like_count: i64, bookmarked: bool) -> InteractionSnapshot {
        InteractionSnapshot {
            liked,
            like_count,
            bookmarked,
            comments_visible: false,
            comment_draft: String::new(),
            edit_draft: String::new(),
            comment_count: 2,
            in_flight: Default::default(),
        }
    }

    #[test]
    fn parse_token_content_trims_whitespace() {
        let token = parse_token_content("  abc.def.ghi  ");
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn parse_token_content_rejects_blank() {
        let token = parse_token_content("   ");
        assert!(token.is_none());
    }

    #[test]
    fn format_counters_marks_liked_and_bookmarked() {
        assert_eq!(
            format_counters(&snapshot(true, 4, true)),
            "♥ 4  💬 2  [в закладках]"
        );
        assert_eq!(format_counters(&snapshot(false, 0, false)), "♡ 0  💬 2");
    }

    #[test]
    fn format_age_picks_largest_unit() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).single().expect("valid ts");
        assert_eq!(format_age(now - Duration::seconds(20), now), "только что");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5 мин назад");
        assert_eq!(format_age(now - Duration::hours(3), now), "3 ч назад");
        assert_eq!(format_age(now - Duration::days(2), now), "2 дн назад");
    }

    #[test]
    fn map_client_error_explains_missing_token() {
        let err = map_client_error(FeedClientError::Unauthorized);
        assert!(err.to_string().contains("feed-cli token"));
    }

    #[test]
    fn cli_parses_comment_command() {
        let cli = Cli::try_parse_from([
            "feed-cli",
            "--server",
            "localhost:3000",
            "comment",
            "--id",
            "p1",
            "--text",
            "hi",
        ])
        .expect("args must parse");

        assert_eq!(cli.server.as_deref(), Some("localhost:3000"));
        match cli.command {
            Command::Comment { id, text } => {
                assert_eq!(id, "p1");
                assert_eq!(text, "hi");
            }
            other => panic!("expected comment command, got {other:?}"),
        }
    }
}
