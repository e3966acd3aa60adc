//! Resource services wired to the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use yatube_core::domain::{NewGroup, NewUser, Principal};
use yatube_core::pagination::PageRequest;
use yatube_core::ports::{ImageStore, StorageError};
use yatube_core::service::{CommentInput, FollowInput, GroupInput, PostInput};
use yatube_core::validation::{DecodedImage, NON_FIELD, field_messages};
use yatube_core::{DomainError, Repositories, Services};
use yatube_infra::InMemoryStore;

const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Default)]
struct RecordingImageStore {
    saved: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn save(&self, image: DecodedImage) -> Result<String, StorageError> {
        let mut saved = self.saved.lock().unwrap();
        let path = format!("posts/{}.{}", saved.len() + 1, image.format.extension());
        saved.push(path.clone());
        Ok(path)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("/media/{path}")
    }
}

struct Fixture {
    repos: Repositories,
    services: Services,
    images: Arc<RecordingImageStore>,
}

impl Fixture {
    fn new() -> Self {
        let repos = Arc::new(InMemoryStore::new()).into_repositories();
        let images = Arc::new(RecordingImageStore::default());
        let services = Services::new(&repos, images.clone());
        Self {
            repos,
            services,
            images,
        }
    }

    async fn user(&self, username: &str) -> Principal {
        let user = self
            .repos
            .users
            .create(NewUser {
                username: username.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        Principal {
            user_id: user.id,
            username: user.username,
        }
    }
}

fn text(text: &str) -> PostInput {
    PostInput {
        text: Some(text.into()),
        ..Default::default()
    }
}

fn field_errors(err: DomainError, field: &str) -> Vec<String> {
    match err {
        DomainError::Validation(errors) => field_messages(&errors).remove(field).unwrap_or_default(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_post_author_is_the_caller() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;

    let post = fx.services.posts.create(Some(&leo), text("hello")).await.unwrap();

    assert_eq!(post.author.id, leo.user_id);
    assert_eq!(post.author.username, "leo");
    assert_eq!(post.group_id, None);
}

#[tokio::test]
async fn test_anonymous_create_is_rejected_without_side_effects() {
    let fx = Fixture::new();

    let err = fx.services.posts.create(None, text("hello")).await.unwrap_err();

    assert!(matches!(err, DomainError::AuthenticationRequired));
    let page = fx.services.posts.list(PageRequest { limit: 10, offset: 0 }).await.unwrap();
    assert_eq!(page.count, 0);
}

#[tokio::test]
async fn test_authentication_is_checked_before_lookup() {
    let fx = Fixture::new();

    let err = fx
        .services
        .posts
        .update(None, 999, text("x"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthenticationRequired));

    let err = fx
        .services
        .comments
        .create(None, 999, CommentInput { text: Some("x".into()) })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthenticationRequired));
}

#[tokio::test]
async fn test_only_author_may_change_a_post() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let anna = fx.user("anna").await;
    let post = fx.services.posts.create(Some(&leo), text("original")).await.unwrap();

    let err = fx
        .services
        .posts
        .update(Some(&anna), post.id, text("hijacked"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PermissionDenied));

    let err = fx.services.posts.destroy(Some(&anna), post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::PermissionDenied));

    let unchanged = fx.services.posts.retrieve(post.id).await.unwrap();
    assert_eq!(unchanged.text, "original");
}

#[tokio::test]
async fn test_permission_is_checked_before_validation() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let anna = fx.user("anna").await;
    let post = fx.services.posts.create(Some(&leo), text("original")).await.unwrap();

    let err = fx
        .services
        .posts
        .update(Some(&anna), post.id, PostInput::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::PermissionDenied));
}

#[tokio::test]
async fn test_update_keeps_pub_date_and_author() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let post = fx.services.posts.create(Some(&leo), text("draft")).await.unwrap();

    let updated = fx
        .services
        .posts
        .update(Some(&leo), post.id, text("final"), false)
        .await
        .unwrap();

    assert_eq!(updated.text, "final");
    assert_eq!(updated.pub_date, post.pub_date);
    assert_eq!(updated.author, post.author);
}

#[tokio::test]
async fn test_full_update_requires_text() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let post = fx.services.posts.create(Some(&leo), text("draft")).await.unwrap();

    let err = fx
        .services
        .posts
        .update(Some(&leo), post.id, PostInput::default(), false)
        .await
        .unwrap_err();
    assert_eq!(field_errors(err, "text"), ["This field is required."]);

    let untouched = fx
        .services
        .posts
        .update(Some(&leo), post.id, PostInput::default(), true)
        .await
        .unwrap();
    assert_eq!(untouched.text, "draft");
}

#[tokio::test]
async fn test_post_group_must_exist_and_can_be_cleared() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;

    let err = fx
        .services
        .posts
        .create(
            Some(&leo),
            PostInput {
                group: Some(Some(42)),
                ..text("tagged")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        field_errors(err, "group"),
        ["Invalid pk \"42\" - object does not exist."]
    );

    let group = fx
        .services
        .groups
        .create(GroupInput {
            title: Some("Classics".into()),
            slug: Some("classics".into()),
            description: Some("Old books".into()),
        })
        .await
        .unwrap();
    let post = fx
        .services
        .posts
        .create(
            Some(&leo),
            PostInput {
                group: Some(Some(group.id)),
                ..text("tagged")
            },
        )
        .await
        .unwrap();
    assert_eq!(post.group_id, Some(group.id));

    let cleared = fx
        .services
        .posts
        .update(
            Some(&leo),
            post.id,
            PostInput {
                group: Some(None),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
    assert_eq!(cleared.group_id, None);
}

#[tokio::test]
async fn test_post_image_is_stored() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;

    let post = fx
        .services
        .posts
        .create(
            Some(&leo),
            PostInput {
                image: Some(Some(PNG_1X1.into())),
                ..text("with picture")
            },
        )
        .await
        .unwrap();
    assert_eq!(post.image.as_deref(), Some("posts/1.png"));
    assert_eq!(fx.images.saved.lock().unwrap().len(), 1);

    let err = fx
        .services
        .posts
        .create(
            Some(&leo),
            PostInput {
                image: Some(Some("bm90IGFuIGltYWdl".into())),
                ..text("broken")
            },
        )
        .await
        .unwrap_err();
    assert!(!field_errors(err, "image").is_empty());
    assert_eq!(fx.images.saved.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_comment_update_keeps_post_and_created() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let post = fx.services.posts.create(Some(&leo), text("post")).await.unwrap();
    let comment = fx
        .services
        .comments
        .create(Some(&leo), post.id, CommentInput { text: Some("first".into()) })
        .await
        .unwrap();

    let updated = fx
        .services
        .comments
        .update(
            Some(&leo),
            post.id,
            comment.id,
            CommentInput { text: Some("edited".into()) },
            false,
        )
        .await
        .unwrap();

    assert_eq!(updated.text, "edited");
    assert_eq!(updated.post_id, post.id);
    assert_eq!(updated.created, comment.created);
}

#[tokio::test]
async fn test_comments_are_scoped_to_their_post() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let first = fx.services.posts.create(Some(&leo), text("first")).await.unwrap();
    let second = fx.services.posts.create(Some(&leo), text("second")).await.unwrap();
    let comment = fx
        .services
        .comments
        .create(Some(&leo), first.id, CommentInput { text: Some("hi".into()) })
        .await
        .unwrap();

    let err = fx.services.comments.retrieve(second.id, comment.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "Comment", .. }));

    let err = fx
        .services
        .comments
        .create(Some(&leo), 999, CommentInput { text: Some("hi".into()) })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "Post", id: 999 }));

    assert!(fx.services.comments.list(second.id).await.unwrap().is_empty());
    assert_eq!(fx.services.comments.list(first.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_user_cascades_through_services() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let anna = fx.user("anna").await;
    let post = fx.services.posts.create(Some(&leo), text("leo's")).await.unwrap();
    fx.services
        .comments
        .create(Some(&anna), post.id, CommentInput { text: Some("nice".into()) })
        .await
        .unwrap();
    fx.services
        .follows
        .create(Some(&anna), FollowInput { following: Some("leo".into()) })
        .await
        .unwrap();

    fx.repos.users.delete(leo.user_id).await.unwrap();

    let err = fx.services.posts.retrieve(post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    assert!(fx.services.follows.list(Some(&anna), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_group_keeps_posts() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    let group = fx
        .repos
        .groups
        .create(NewGroup {
            title: "Poetry".into(),
            slug: "poetry".into(),
            description: "Verse".into(),
        })
        .await
        .unwrap();
    let post = fx
        .services
        .posts
        .create(
            Some(&leo),
            PostInput {
                group: Some(Some(group.id)),
                ..text("verse")
            },
        )
        .await
        .unwrap();

    fx.repos.groups.delete(group.id).await.unwrap();

    let post = fx.services.posts.retrieve(post.id).await.unwrap();
    assert_eq!(post.group_id, None);
}

#[tokio::test]
async fn test_follow_rules() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;
    fx.user("anna").await;
    let follow = |name: &str| FollowInput {
        following: Some(name.into()),
    };

    let created = fx.services.follows.create(Some(&leo), follow("anna")).await.unwrap();
    assert_eq!(created.user.username, "leo");
    assert_eq!(created.following.username, "anna");

    let err = fx.services.follows.create(Some(&leo), follow("anna")).await.unwrap_err();
    assert_eq!(
        field_errors(err, NON_FIELD),
        ["The fields user, following must make a unique set."]
    );

    let err = fx.services.follows.create(Some(&leo), follow("leo")).await.unwrap_err();
    assert_eq!(field_errors(err, "following"), ["You cannot follow yourself."]);

    let err = fx.services.follows.create(Some(&leo), follow("ghost")).await.unwrap_err();
    assert_eq!(
        field_errors(err, "following"),
        ["Object with username=ghost does not exist."]
    );

    let err = fx.services.follows.list(None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::AuthenticationRequired));
}

#[tokio::test]
async fn test_follow_search() {
    let fx = Fixture::new();
    let reader = fx.user("reader").await;
    for name in ["Tolstoy", "Dostoevsky", "Chekhov"] {
        fx.user(name).await;
        fx.services
            .follows
            .create(Some(&reader), FollowInput { following: Some(name.into()) })
            .await
            .unwrap();
    }

    let found = fx.services.follows.list(Some(&reader), Some("sky, DOS")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].following.username, "Dostoevsky");

    let all = fx.services.follows.list(Some(&reader), Some("  ")).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_group_slug_is_unique() {
    let fx = Fixture::new();
    let input = || GroupInput {
        title: Some("Classics".into()),
        slug: Some("classics".into()),
        description: Some("Old books".into()),
    };

    fx.services.groups.create(input()).await.unwrap();
    let err = fx.services.groups.create(input()).await.unwrap_err();

    assert_eq!(
        field_errors(err, "slug"),
        ["group with this slug already exists."]
    );
    assert_eq!(fx.services.groups.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_group_field_rules() {
    let fx = Fixture::new();

    let err = fx
        .services
        .groups
        .create(GroupInput {
            title: Some("x".repeat(129)),
            slug: Some("not a slug".into()),
            description: None,
        })
        .await
        .unwrap_err();

    let DomainError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let messages = field_messages(&errors);
    assert_eq!(
        messages["title"],
        ["Ensure this field has no more than 128 characters."]
    );
    assert_eq!(
        messages["slug"],
        ["Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens."]
    );
    assert_eq!(messages["description"], ["This field is required."]);

    let group = fx
        .services
        .groups
        .create(GroupInput {
            title: Some("  Poetry ".into()),
            slug: Some("poetry".into()),
            description: Some("Verses".into()),
        })
        .await
        .unwrap();
    assert_eq!(group.title, "Poetry");
}

#[tokio::test]
async fn test_image_removed_when_post_insert_fails() {
    let fx = Fixture::new();
    let ghost = fx.user("ghost").await;
    fx.repos.users.delete(ghost.user_id).await.unwrap();

    let input = PostInput {
        text: Some("boo".into()),
        image: Some(Some(PNG_1X1.into())),
        ..Default::default()
    };
    fx.services.posts.create(Some(&ghost), input).await.unwrap_err();

    let saved = fx.images.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(*fx.images.deleted.lock().unwrap(), saved);
}

#[tokio::test]
async fn test_image_kept_when_post_insert_succeeds() {
    let fx = Fixture::new();
    let leo = fx.user("leo").await;

    let input = PostInput {
        text: Some("sunset".into()),
        image: Some(Some(PNG_1X1.into())),
        ..Default::default()
    };
    let post = fx.services.posts.create(Some(&leo), input).await.unwrap();

    assert!(post.image.is_some());
    assert!(fx.images.deleted.lock().unwrap().is_empty());
}
