//! Integration tests for `SqliteStore` against an in-memory database.

use std::{collections::HashSet, sync::Arc};

use chrono::Duration;
use taleweave_core::{
  Pipeline,
  limiter::RateLimiter,
  moderation::ProfanityFilter,
  store::{Insertion, StoryStore},
  story::{NewLine, NewStory, Story, StoryDraft, StoryLine},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_story(slug: &str) -> NewStory {
  NewStory {
    title:        format!("Title of {slug}"),
    slug:         slug.into(),
    description:  "A story for testing.".into(),
    starter_text: "It was a dark night.".into(),
    ip_hash:      "ab".repeat(32),
  }
}

async fn insert(s: &SqliteStore, slug: &str) -> (Story, StoryLine) {
  match s.insert_story(new_story(slug)).await.unwrap() {
    Insertion::Created(pair) => pair,
    Insertion::SlugTaken => panic!("slug {slug} unexpectedly taken"),
  }
}

fn new_line(story_id: Uuid, text: &str) -> NewLine {
  NewLine { story_id, text: text.into(), ip_hash: "cd".repeat(32) }
}

// ─── Stories ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_find_story() {
  let s = store().await;
  let (story, starter) = insert(&s, "dark-night").await;

  assert!(story.is_active);
  assert_eq!(story.created_at, story.last_activity_at);
  assert!(starter.is_starter_text);
  assert_eq!(starter.timestamp, story.created_at);

  let fetched = s.find_active_story("dark-night").await.unwrap();
  assert_eq!(fetched, Some(story));
}

#[tokio::test]
async fn find_missing_story_returns_none() {
  let s = store().await;
  assert!(s.find_active_story("nothing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_slug_is_reported_and_writes_nothing() {
  let s = store().await;
  let (first, _) = insert(&s, "twins").await;

  let second = s.insert_story(new_story("twins")).await.unwrap();
  assert_eq!(second, Insertion::SlugTaken);

  assert_eq!(s.list_active_stories().await.unwrap().len(), 1);
  assert_eq!(s.story_lines(first.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_starter_insert_rolls_back_the_story() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER reject_starter BEFORE INSERT ON story_lines
           WHEN NEW.text = 'boom.'
         BEGIN SELECT RAISE(ABORT, 'starter rejected'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let input = NewStory { starter_text: "boom.".into(), ..new_story("doomed") };
  assert!(s.insert_story(input).await.is_err());

  assert!(!s.slug_exists("doomed").await.unwrap());
  assert!(s.list_active_stories().await.unwrap().is_empty());

  // The slug is still free for a later attempt.
  insert(&s, "doomed").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_with_one_title_all_succeed() {
  let pipeline = Arc::new(Pipeline::new(
    Arc::new(store().await),
    RateLimiter::new(std::time::Duration::from_secs(60), 1),
    ProfanityFilter::default(),
  ));

  let handles: Vec<_> = (0..20)
    .map(|i| {
      let pipeline = Arc::clone(&pipeline);
      tokio::spawn(async move {
        let draft = StoryDraft {
          title:        Some("Same".into()),
          description:  Some("Crowded.".into()),
          starter_text: Some("Everyone arrived at once.".into()),
        };
        pipeline.create_story(draft, &format!("10.0.1.{i}")).await
      })
    })
    .collect();

  let mut slugs = HashSet::new();
  for h in handles {
    let (story, _) = h.await.unwrap().unwrap();
    slugs.insert(story.slug);
  }
  assert_eq!(slugs.len(), 20);
  assert!(slugs.contains("same"));
  assert_eq!(pipeline.list_stories().await.unwrap().len(), 20);
}

#[tokio::test]
async fn slug_exists_covers_hidden_stories() {
  let s = store().await;
  insert(&s, "hidden").await;
  assert!(s.slug_exists("hidden").await.unwrap());
  assert!(!s.slug_exists("other").await.unwrap());

  assert!(s.set_story_active("hidden", false).await.unwrap());
  assert!(s.slug_exists("hidden").await.unwrap());
  assert!(s.find_active_story("hidden").await.unwrap().is_none());
  assert_eq!(
    s.insert_story(new_story("hidden")).await.unwrap(),
    Insertion::SlugTaken
  );
}

#[tokio::test]
async fn hidden_stories_can_be_shown_again() {
  let s = store().await;
  insert(&s, "phoenix").await;
  s.set_story_active("phoenix", false).await.unwrap();
  assert!(s.list_active_stories().await.unwrap().is_empty());

  s.set_story_active("phoenix", true).await.unwrap();
  let listed = s.list_active_stories().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].slug, "phoenix");
}

#[tokio::test]
async fn set_active_on_unknown_slug_reports_false() {
  let s = store().await;
  assert!(!s.set_story_active("ghost", false).await.unwrap());
}

#[tokio::test]
async fn listing_is_ordered_by_latest_activity() {
  let s = store().await;
  let (a, _) = insert(&s, "a").await;
  let (b, _) = insert(&s, "b").await;
  insert(&s, "c").await;

  s.touch_story(a.id, a.created_at + Duration::seconds(20)).await.unwrap();
  s.touch_story(b.id, b.created_at + Duration::seconds(10)).await.unwrap();

  let slugs: Vec<String> = s
    .list_active_stories()
    .await
    .unwrap()
    .into_iter()
    .map(|summary| summary.slug)
    .collect();
  assert_eq!(slugs, ["a", "b", "c"]);
}

// ─── Activity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn touch_only_moves_forward() {
  let s = store().await;
  let (story, _) = insert(&s, "clock").await;

  let later = story.created_at + Duration::minutes(5);
  assert!(s.touch_story(story.id, later).await.unwrap());
  let fetched = s.find_active_story("clock").await.unwrap().unwrap();
  assert_eq!(fetched.last_activity_at, later);

  let earlier = story.created_at - Duration::minutes(5);
  assert!(s.touch_story(story.id, earlier).await.unwrap());
  let fetched = s.find_active_story("clock").await.unwrap().unwrap();
  assert_eq!(fetched.last_activity_at, later);
}

#[tokio::test]
async fn touch_unknown_story_reports_false() {
  let s = store().await;
  let touched = s
    .touch_story(Uuid::new_v4(), chrono::Utc::now())
    .await
    .unwrap();
  assert!(!touched);
}

// ─── Lines ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lines_come_back_oldest_first_with_starter_leading() {
  let s = store().await;
  let (story, starter) = insert(&s, "chain").await;

  let one = s.append_line(new_line(story.id, "One.")).await.unwrap();
  let two = s.append_line(new_line(story.id, "Two.")).await.unwrap();
  let three = s.append_line(new_line(story.id, "Three.")).await.unwrap();

  let lines = s.story_lines(story.id).await.unwrap();
  let ids: Vec<Uuid> = lines.iter().map(|l| l.id).collect();
  assert_eq!(ids, [starter.id, one.id, two.id, three.id]);
  assert_eq!(lines.iter().filter(|l| l.is_starter_text).count(), 1);
  assert_eq!(lines[3], three);
}

#[tokio::test]
async fn lines_keep_their_ip_hash() {
  let s = store().await;
  let (story, _) = insert(&s, "hashes").await;
  s.append_line(new_line(story.id, "Hi.")).await.unwrap();

  let lines = s.story_lines(story.id).await.unwrap();
  assert_eq!(lines[0].ip_hash, "ab".repeat(32));
  assert_eq!(lines[1].ip_hash, "cd".repeat(32));
}

#[tokio::test]
async fn lines_are_scoped_to_their_story() {
  let s = store().await;
  let (x, _) = insert(&s, "x").await;
  let (y, _) = insert(&s, "y").await;
  s.append_line(new_line(x.id, "Only in x.")).await.unwrap();

  assert_eq!(s.story_lines(x.id).await.unwrap().len(), 2);
  assert_eq!(s.story_lines(y.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn append_to_unknown_story_fails() {
  let s = store().await;
  let err = s.append_line(new_line(Uuid::new_v4(), "Orphan.")).await;
  assert!(matches!(err, Err(crate::Error::Database(_))));
}

#[tokio::test]
async fn remove_line_deletes_only_that_line() {
  let s = store().await;
  let (story, starter) = insert(&s, "undo").await;
  let line = s.append_line(new_line(story.id, "Oops.")).await.unwrap();

  s.remove_line(line.id).await.unwrap();
  let lines = s.story_lines(story.id).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].id, starter.id);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_survives_reopen() {
  let path = std::env::temp_dir().join(format!("taleweave-{}.db", Uuid::new_v4()));

  let story = {
    let s = SqliteStore::open(&path).await.unwrap();
    insert(&s, "durable").await.0
  };

  let reopened = SqliteStore::open(&path).await.unwrap();
  let fetched = reopened.find_active_story("durable").await.unwrap();
  assert_eq!(fetched, Some(story));

  drop(reopened);
  let _ = std::fs::remove_file(&path);
}
