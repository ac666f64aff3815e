//! Claim/submit protocol tests against a live Postgres.
//!
//! These exercise the atomicity guarantees that the session-layer mock
//! tests cannot: disjoint concurrent claims, staleness reclamation, and
//! the first-submitter-wins transaction.
//!
//! They need a running Postgres (`DATABASE_URL`), so they are `#[ignore]`d
//! by default; run with `cargo test -p memelab-db -- --ignored`.

use sqlx::PgPool;
use uuid::Uuid;

use memelab_core::types::AnnotationStatus;
use memelab_db::models::{AnnotationListQuery, CreateMeme};
use memelab_db::repositories::annotation_repo::SubmitResult;
use memelab_db::repositories::{AnnotationRepo, MemeRepo};

const STALENESS_SECS: u64 = 900;

async fn seed_memes(pool: &PgPool, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let meme = MemeRepo::insert(
            pool,
            &CreateMeme {
                file_name: format!("meme-{i}.png"),
                storage_path: format!("pool/meme-{i}.png"),
                source_folder: "test-batch".into(),
            },
        )
        .await
        .unwrap();
        ids.push(meme.id);
    }
    ids
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn concurrent_claims_are_disjoint(pool: PgPool) {
    seed_memes(&pool, 6).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (a, b) = tokio::join!(
        MemeRepo::claim_batch(&pool, alice, 5, STALENESS_SECS),
        MemeRepo::claim_batch(&pool, bob, 5, STALENESS_SECS),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(a.len() + b.len(), 6, "two claims over 6 items cover all 6");
    assert!(a.len() < 5 || b.len() < 5, "at least one claim came up short");
    for meme in &a {
        assert!(!b.iter().any(|m| m.id == meme.id), "claims overlap on {}", meme.id);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn claim_skips_reserved_inactive_and_annotated(pool: PgPool) {
    let ids = seed_memes(&pool, 3).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    // ids[0] live-reserved by bob, ids[1] deactivated, ids[2] claimable.
    MemeRepo::claim_batch(&pool, bob, 1, STALENESS_SECS).await.unwrap();
    assert!(MemeRepo::set_active(&pool, ids[1], false).await.unwrap());

    let claimed = MemeRepo::claim_batch(&pool, alice, 5, STALENESS_SECS).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, ids[2]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn stale_reservation_is_reclaimed(pool: PgPool) {
    let ids = seed_memes(&pool, 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let first = MemeRepo::claim_batch(&pool, bob, 1, STALENESS_SECS).await.unwrap();
    assert_eq!(first.len(), 1);

    // Fresh reservation holds the item.
    let blocked = MemeRepo::claim_batch(&pool, alice, 1, STALENESS_SECS).await.unwrap();
    assert!(blocked.is_empty());

    // Age the reservation past the threshold.
    sqlx::query("UPDATE memes SET reserved_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(ids[0])
        .execute(&pool)
        .await
        .unwrap();

    let reclaimed = MemeRepo::claim_batch(&pool, alice, 1, STALENESS_SECS).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].reserved_by, Some(alice));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn own_reservation_is_served_again_on_retry(pool: PgPool) {
    seed_memes(&pool, 2).await;
    let alice = Uuid::new_v4();

    let first = MemeRepo::claim_batch(&pool, alice, 2, STALENESS_SECS).await.unwrap();
    let second = MemeRepo::claim_batch(&pool, alice, 2, STALENESS_SECS).await.unwrap();

    let mut first_ids: Vec<_> = first.iter().map(|m| m.id).collect();
    let mut second_ids: Vec<_> = second.iter().map(|m| m.id).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn release_reservation_is_idempotent(pool: PgPool) {
    let ids = seed_memes(&pool, 1).await;
    let alice = Uuid::new_v4();
    MemeRepo::claim_batch(&pool, alice, 1, STALENESS_SECS).await.unwrap();

    MemeRepo::release_reservation(&pool, ids[0]).await.unwrap();
    // Second release of an unreserved row is a no-op, not an error.
    MemeRepo::release_reservation(&pool, ids[0]).await.unwrap();

    let meme = MemeRepo::find_by_id(&pool, ids[0]).await.unwrap().unwrap();
    assert_eq!(meme.reserved_by, None);
    assert_eq!(meme.reserved_at, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn first_submitter_wins(pool: PgPool) {
    let ids = seed_memes(&pool, 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let first = AnnotationRepo::submit_final(&pool, ids[0], alice, "when the build passes")
        .await
        .unwrap();
    let annotation = match first {
        SubmitResult::Saved(a) => a,
        SubmitResult::AlreadyAnnotated => panic!("first submit must win"),
    };
    assert_eq!(annotation.status, "pending");

    let second = AnnotationRepo::submit_final(&pool, ids[0], bob, "me trying to merge")
        .await
        .unwrap();
    assert!(matches!(second, SubmitResult::AlreadyAnnotated));

    // The winner took the meme out of the pool and cleared the reservation.
    let meme = MemeRepo::find_by_id(&pool, ids[0]).await.unwrap().unwrap();
    assert_eq!(meme.annotation_count, 1);
    assert_eq!(meme.reserved_by, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn completed_meme_is_never_reclaimed(pool: PgPool) {
    let ids = seed_memes(&pool, 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    AnnotationRepo::submit_final(&pool, ids[0], alice, "done").await.unwrap();

    let claimed = MemeRepo::claim_batch(&pool, bob, 5, STALENESS_SECS).await.unwrap();
    assert!(claimed.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn history_count_tracks_submissions(pool: PgPool) {
    let ids = seed_memes(&pool, 2).await;
    let alice = Uuid::new_v4();

    assert_eq!(AnnotationRepo::count_by_annotator(&pool, alice).await.unwrap(), 0);

    AnnotationRepo::submit_final(&pool, ids[0], alice, "one").await.unwrap();
    AnnotationRepo::submit_final(&pool, ids[1], alice, "two").await.unwrap();

    assert_eq!(AnnotationRepo::count_by_annotator(&pool, alice).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn caption_editable_only_while_pending(pool: PgPool) {
    let ids = seed_memes(&pool, 1).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let saved = AnnotationRepo::submit_final(&pool, ids[0], alice, "draft").await.unwrap();
    let annotation = match saved {
        SubmitResult::Saved(a) => a,
        SubmitResult::AlreadyAnnotated => panic!("submit must succeed"),
    };

    // Wrong owner: no edit.
    assert!(!AnnotationRepo::update_caption(&pool, annotation.id, bob, "hijacked").await.unwrap());
    // Owner while pending: edit lands.
    assert!(AnnotationRepo::update_caption(&pool, annotation.id, alice, "final").await.unwrap());

    // After moderation the caption is frozen.
    assert!(AnnotationRepo::review(&pool, annotation.id, AnnotationStatus::Approved, None)
        .await
        .unwrap());
    assert!(!AnnotationRepo::update_caption(&pool, annotation.id, alice, "too late").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn pending_list_is_oldest_first(pool: PgPool) {
    let ids = seed_memes(&pool, 3).await;
    let alice = Uuid::new_v4();
    for id in &ids {
        AnnotationRepo::submit_final(&pool, *id, alice, "caption").await.unwrap();
    }

    let listed = AnnotationRepo::list_pending(&pool, &AnnotationListQuery::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
    let meme_ids: Vec<_> = listed.iter().map(|a| a.meme_id).collect();
    assert_eq!(meme_ids, ids);
}
