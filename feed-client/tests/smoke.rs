use feed_client::interaction::{Outcome, PostInteractions, TracingNotifier};
use feed_client::{FeedClient, HttpConfig};

#[tokio::test]
#[ignore = "requires running feed API and a session token in FEED_TOKEN"]
async fn http_smoke_flow() {
    let base_url =
        std::env::var("FEED_HTTP_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let token = std::env::var("FEED_TOKEN").expect("FEED_TOKEN must be set");

    let mut client = FeedClient::new(HttpConfig::new(base_url)).expect("client must build");
    client.set_token(token);

    let viewer = client
        .current_viewer()
        .await
        .expect("current_viewer must succeed");
    assert!(viewer.is_authenticated());

    let created = client
        .create_post("smoke post", None)
        .await
        .expect("create_post must succeed");
    assert!(created.success);

    let posts = client.list_posts(Some(20)).await.expect("list_posts must succeed");
    let post = posts
        .into_iter()
        .find(|post| viewer.is(&post.author.id))
        .expect("own post must be in the feed");

    let ctl = PostInteractions::new(&post, viewer.clone(), client.clone(), TracingNotifier);
    let before = ctl.snapshot();

    assert_eq!(ctl.toggle_like().await, Outcome::Committed);
    assert_eq!(ctl.toggle_bookmark().await, Outcome::Committed);
    assert_eq!(ctl.submit_comment("smoke comment").await, Outcome::Committed);
    assert_eq!(ctl.submit_edit("smoke post edited").await, Outcome::Committed);

    let fresh = client.get_post(&post.id).await.expect("get_post must succeed");
    ctl.refresh(&fresh);
    let snapshot = ctl.snapshot();
    assert_ne!(snapshot.liked, before.liked);
    assert_ne!(snapshot.bookmarked, before.bookmarked);
    assert!(ctl.comments().iter().any(|c| c.content == "smoke comment"));

    assert_eq!(
        ctl.submit_delete().await.expect("delete must succeed"),
        Outcome::Committed
    );
}
