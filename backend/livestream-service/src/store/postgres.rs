use super::EntityStore;
use crate::config::Config;
use crate::error::{LivestreamError, Result};
use crate::models::{
    Livecomment, LivecommentReport, Livestream, LivestreamActivity, LivestreamViewer,
    NewLivecomment, NewLivecommentReport, NewLivestream, NewNgWord, NewReaction, NewUser, NgWord,
    Reaction, ScoreEntry, SlotRange, SubjectKind, User, UserActivity,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Create the connection pool described by `config`.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    info!(
        service = %config.service_name,
        max_connections = config.db_max_connections,
        min_connections = config.db_min_connections,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("Database pool ready");
    Ok(pool)
}

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed entity store.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: Arc<PgPool>,
}

impl PgEntityStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, display_name, description, password, icon_hash, dark_mode";
const LIVESTREAM_COLUMNS: &str =
    "id, user_id, title, description, playlist_url, thumbnail_url, start_at, end_at, raw_tags";

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn select_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(&*self.pool)
            .await?;
        Ok(users)
    }

    async fn select_livestreams(&self) -> Result<Vec<Livestream>> {
        let livestreams = sqlx::query_as::<_, Livestream>(&format!(
            "SELECT {LIVESTREAM_COLUMNS} FROM livestreams"
        ))
        .fetch_all(&*self.pool)
        .await?;
        Ok(livestreams)
    }

    async fn select_ng_words(&self) -> Result<Vec<NgWord>> {
        let words = sqlx::query_as::<_, NgWord>(
            r#"
            SELECT id, user_id, livestream_id, word, created_at
            FROM ng_words
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;
        Ok(words)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(user)
    }

    async fn find_livestream(&self, livestream_id: i64) -> Result<Option<Livestream>> {
        let livestream = sqlx::query_as::<_, Livestream>(&format!(
            "SELECT {LIVESTREAM_COLUMNS} FROM livestreams WHERE id = $1"
        ))
        .bind(livestream_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(livestream)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, display_name, description, password, dark_mode)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.display_name)
        .bind(&user.description)
        .bind(&user.hashed_password)
        .bind(user.dark_mode)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(user_id = user_id, name = %user.name, "User inserted");
        Ok(user.into_user(user_id))
    }

    async fn update_icon(&self, user_id: i64, image: &[u8], icon_hash: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET icon_hash = $1 WHERE id = $2")
            .bind(icon_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM icons WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let icon_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO icons (user_id, image) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(image)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(icon_id)
    }

    async fn reserve_livestream(
        &self,
        livestream: NewLivestream,
        slots: SlotRange,
    ) -> Result<Livestream> {
        let mut tx = self.pool.begin().await?;

        // Row locks keep concurrent reservations from overbooking a slot.
        let remaining = sqlx::query_scalar::<_, i64>(
            "SELECT slot FROM reservation_slots WHERE id >= $1 AND id <= $2 FOR UPDATE",
        )
        .bind(slots.start)
        .bind(slots.end)
        .fetch_all(&mut *tx)
        .await?;

        if remaining.iter().min().map_or(true, |min| *min < 1) {
            return Err(LivestreamError::ReservationUnavailable {
                start_slot: slots.start,
                end_slot: slots.end,
            });
        }

        sqlx::query("UPDATE reservation_slots SET slot = slot - 1 WHERE id >= $1 AND id <= $2")
            .bind(slots.start)
            .bind(slots.end)
            .execute(&mut *tx)
            .await?;

        let raw_tags = livestream.raw_tags();
        let livestream_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO livestreams (
                user_id, title, description, playlist_url, thumbnail_url,
                start_at, end_at, raw_tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(livestream.user_id)
        .bind(&livestream.title)
        .bind(&livestream.description)
        .bind(&livestream.playlist_url)
        .bind(&livestream.thumbnail_url)
        .bind(livestream.start_at)
        .bind(livestream.end_at)
        .bind(&raw_tags)
        .fetch_one(&mut *tx)
        .await?;

        if !livestream.tags.is_empty() {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO livestream_tags (livestream_id, tag_id) ");
            builder.push_values(&livestream.tags, |mut row, tag_id| {
                row.push_bind(livestream_id).push_bind(*tag_id);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(livestream.into_livestream(livestream_id))
    }

    async fn select_livestream_ids(&self, limit: Option<i64>) -> Result<Vec<i64>> {
        let ids =
            sqlx::query_scalar::<_, i64>("SELECT id FROM livestreams ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&*self.pool)
                .await?;
        Ok(ids)
    }

    async fn select_livestream_ids_by_tag(&self, tag_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT l.id
            FROM livestreams l
            INNER JOIN livestream_tags t ON t.livestream_id = l.id
            WHERE t.tag_id = $1
            GROUP BY l.id
            ORDER BY l.id DESC
            "#,
        )
        .bind(tag_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(ids)
    }

    async fn select_livestream_ids_by_user(&self, user_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM livestreams WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(ids)
    }

    async fn find_icon(&self, user_id: i64) -> Result<Option<Vec<u8>>> {
        let image = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT image FROM icons WHERE user_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(image)
    }

    async fn insert_viewer(&self, viewer: LivestreamViewer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO livestream_viewers_history (user_id, livestream_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(viewer.user_id)
        .bind(viewer.livestream_id)
        .bind(viewer.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn delete_viewer(&self, user_id: i64, livestream_id: i64) -> Result<u64> {
        let deleted = sqlx::query(
            "DELETE FROM livestream_viewers_history WHERE user_id = $1 AND livestream_id = $2",
        )
        .bind(user_id)
        .bind(livestream_id)
        .execute(&*self.pool)
        .await?
        .rows_affected();
        Ok(deleted)
    }

    async fn insert_livecomment(&self, livecomment: NewLivecomment) -> Result<Livecomment> {
        let mut tx = self.pool.begin().await?;

        let livecomment_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO livecomments (user_id, livestream_id, comment, tip, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(livecomment.user_id)
        .bind(livecomment.livestream_id)
        .bind(&livecomment.comment)
        .bind(livecomment.tip)
        .bind(livecomment.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(livecomment.into_livecomment(livecomment_id))
    }

    async fn select_livecomments(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Livecomment>> {
        let comments = sqlx::query_as::<_, Livecomment>(
            r#"
            SELECT id, user_id, livestream_id, comment, tip, created_at
            FROM livecomments
            WHERE livestream_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(livestream_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;
        Ok(comments)
    }

    async fn find_livecomment(&self, livecomment_id: i64) -> Result<Option<Livecomment>> {
        let livecomment = sqlx::query_as::<_, Livecomment>(
            r#"
            SELECT id, user_id, livestream_id, comment, tip, created_at
            FROM livecomments
            WHERE id = $1
            "#,
        )
        .bind(livecomment_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(livecomment)
    }

    async fn insert_livecomment_report(
        &self,
        report: NewLivecommentReport,
    ) -> Result<LivecommentReport> {
        let mut tx = self.pool.begin().await?;

        let report_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO livecomment_reports (user_id, livestream_id, livecomment_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(report.user_id)
        .bind(report.livestream_id)
        .bind(report.livecomment_id)
        .bind(report.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(report.into_report(report_id))
    }

    async fn select_livecomment_reports(
        &self,
        livestream_id: i64,
    ) -> Result<Vec<LivecommentReport>> {
        let reports = sqlx::query_as::<_, LivecommentReport>(
            r#"
            SELECT id, user_id, livestream_id, livecomment_id, created_at
            FROM livecomment_reports
            WHERE livestream_id = $1
            ORDER BY id
            "#,
        )
        .bind(livestream_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(reports)
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<Reaction> {
        let mut tx = self.pool.begin().await?;

        let reaction_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reactions (user_id, livestream_id, emoji_name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(reaction.user_id)
        .bind(reaction.livestream_id)
        .bind(&reaction.emoji_name)
        .bind(reaction.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reaction.into_reaction(reaction_id))
    }

    async fn select_reactions(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Reaction>> {
        let reactions = sqlx::query_as::<_, Reaction>(
            r#"
            SELECT id, user_id, livestream_id, emoji_name, created_at
            FROM reactions
            WHERE livestream_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(livestream_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;
        Ok(reactions)
    }

    async fn insert_ng_word_and_purge(&self, ng_word: NewNgWord) -> Result<(NgWord, u64)> {
        let mut tx = self.pool.begin().await?;

        let word_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO ng_words (user_id, livestream_id, word, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(ng_word.user_id)
        .bind(ng_word.livestream_id)
        .bind(&ng_word.word)
        .bind(ng_word.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let purged = sqlx::query(
            "DELETE FROM livecomments WHERE livestream_id = $1 AND strpos(comment, $2) > 0",
        )
        .bind(ng_word.livestream_id)
        .bind(&ng_word.word)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok((ng_word.into_ng_word(word_id), purged))
    }

    async fn select_scores(&self, kind: SubjectKind) -> Result<Vec<ScoreEntry>> {
        let query = match kind {
            SubjectKind::User => {
                r#"
                SELECT user_id AS subject_id, SUM(score)::BIGINT AS score
                FROM livestream_score
                GROUP BY user_id
                "#
            }
            SubjectKind::Livestream => {
                "SELECT livestream_id AS subject_id, score FROM livestream_score"
            }
        };

        let scores = sqlx::query_as::<_, ScoreEntry>(query)
            .fetch_all(&*self.pool)
            .await?;
        Ok(scores)
    }

    async fn user_activity(&self, user_id: i64) -> Result<UserActivity> {
        let total_reactions = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM livestreams l
            INNER JOIN reactions r ON r.livestream_id = l.id
            WHERE l.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        let (total_livecomments, total_tip) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(c.id), COALESCE(SUM(c.tip), 0)::BIGINT
            FROM livestreams l
            INNER JOIN livecomments c ON c.livestream_id = l.id
            WHERE l.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        let viewers_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM livestreams l
            INNER JOIN livestream_viewers_history h ON h.livestream_id = l.id
            WHERE l.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        let favorite_emoji = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.emoji_name
            FROM livestreams l
            INNER JOIN reactions r ON r.livestream_id = l.id
            WHERE l.user_id = $1
            GROUP BY r.emoji_name
            ORDER BY COUNT(*) DESC, r.emoji_name DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?
        .unwrap_or_default();

        Ok(UserActivity {
            viewers_count,
            total_reactions,
            total_livecomments,
            total_tip,
            favorite_emoji,
        })
    }

    async fn livestream_activity(&self, livestream_id: i64) -> Result<LivestreamActivity> {
        let viewers_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM livestream_viewers_history WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&*self.pool)
        .await?;

        let max_tip = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(tip), 0) FROM livecomments WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&*self.pool)
        .await?;

        let total_reactions = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reactions WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&*self.pool)
        .await?;

        let total_reports = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM livecomment_reports WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(LivestreamActivity {
            viewers_count,
            total_reactions,
            total_reports,
            max_tip,
        })
    }
}
