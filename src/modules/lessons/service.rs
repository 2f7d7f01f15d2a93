use anyhow::{Context, anyhow};
use lectern_core::AppError;
use lectern_models::{LessonId, UserId};
use sqlx::PgPool;
use tracing::{info, instrument};

use super::model::{CreateLessonDto, Lesson, LessonFilterParams, UpdateLessonDto};
use crate::modules::courses::service::CourseService;

const LESSON_COLUMNS: &str =
    "id, course_id, name, description, video_url, created_at, updated_at";

pub struct LessonService;

impl LessonService {
    #[instrument(skip(db))]
    pub async fn get_lessons(
        db: &PgPool,
        filters: LessonFilterParams,
    ) -> Result<Vec<Lesson>, AppError> {
        let lessons = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons
             WHERE ($1::BIGINT IS NULL OR course_id = $1)
             ORDER BY course_id, id",
            LESSON_COLUMNS
        ))
        .bind(filters.course_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch lessons")
        .map_err(AppError::database)?;

        Ok(lessons)
    }

    #[instrument(skip(db))]
    pub async fn get_lesson(db: &PgPool, id: LessonId) -> Result<Lesson, AppError> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons WHERE id = $1",
            LESSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch lesson")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Lesson not found")))
    }

    /// Adds a lesson to a course the caller owns.
    #[instrument(skip(db, dto))]
    pub async fn create_lesson(
        db: &PgPool,
        user_id: UserId,
        dto: CreateLessonDto,
    ) -> Result<Lesson, AppError> {
        CourseService::owned_course(db, dto.course_id, user_id).await?;

        let Some(lesson) = sqlx::query_as::<_, Lesson>(&format!(
            "INSERT INTO lessons (course_id, name, description, video_url)
             SELECT $1, $2, $3, $4
             WHERE EXISTS (SELECT 1 FROM courses WHERE id = $1 AND owner_user_id = $5)
             RETURNING {}",
            LESSON_COLUMNS
        ))
        .bind(dto.course_id)
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.video_url.unwrap_or_default())
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to insert lesson")
        .map_err(AppError::database)?
        else {
            return Err(CourseService::write_refused(db, dto.course_id, user_id).await);
        };

        info!(lesson_id = %lesson.id, course_id = %lesson.course_id, "Lesson created");
        Ok(lesson)
    }

    async fn owned_lesson(db: &PgPool, id: LessonId, user_id: UserId) -> Result<Lesson, AppError> {
        let lesson = Self::get_lesson(db, id).await?;
        CourseService::owned_course(db, lesson.course_id, user_id).await?;
        Ok(lesson)
    }

    /// Error for a guarded lesson write that matched no row.
    async fn write_refused(db: &PgPool, lesson: &Lesson, user_id: UserId) -> AppError {
        match CourseService::owned_course(db, lesson.course_id, user_id).await {
            Err(err) => err,
            Ok(_) => AppError::not_found(anyhow!("Lesson not found")),
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn update_lesson(
        db: &PgPool,
        user_id: UserId,
        id: LessonId,
        dto: UpdateLessonDto,
    ) -> Result<Lesson, AppError> {
        let lesson = Self::owned_lesson(db, id, user_id).await?;

        let updated = sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 video_url = COALESCE($4, video_url),
                 updated_at = NOW()
             WHERE id = $1
               AND course_id IN (SELECT id FROM courses WHERE owner_user_id = $5)
             RETURNING {}",
            LESSON_COLUMNS
        ))
        .bind(id)
        .bind(dto.name)
        .bind(dto.description)
        .bind(dto.video_url)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to update lesson")
        .map_err(AppError::database)?;

        match updated {
            Some(updated) => Ok(updated),
            None => Err(Self::write_refused(db, &lesson, user_id).await),
        }
    }

    #[instrument(skip(db))]
    pub async fn delete_lesson(db: &PgPool, user_id: UserId, id: LessonId) -> Result<(), AppError> {
        let lesson = Self::owned_lesson(db, id, user_id).await?;

        let deleted = sqlx::query(
            "DELETE FROM lessons
             WHERE id = $1
               AND course_id IN (SELECT id FROM courses WHERE owner_user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("Failed to delete lesson")
        .map_err(AppError::database)?
        .rows_affected();
        if deleted == 0 {
            return Err(Self::write_refused(db, &lesson, user_id).await);
        }

        info!(lesson_id = %id, "Lesson deleted");
        Ok(())
    }
}

