use anyhow::{Context, anyhow};
use lectern_core::AppError;
use lectern_models::{CourseId, UserId};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use super::model::{Course, CreateCourseDto, UpdateCourseDto};

const COURSE_SELECT: &str = "
    SELECT c.id, c.name, c.description, c.estimation, c.owner_user_id,
           c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count
    FROM courses c";

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db))]
    pub async fn get_courses(db: &PgPool) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!("{} ORDER BY c.id", COURSE_SELECT))
            .fetch_all(db)
            .await
            .context("Failed to fetch courses")
            .map_err(AppError::database)?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!("{} WHERE c.id = $1", COURSE_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch course")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_course(
        db: &PgPool,
        owner: UserId,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (name, description, estimation, owner_user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, description, estimation, owner_user_id,
                       created_at, updated_at, 0::BIGINT AS lesson_count",
        )
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.estimation)
        .bind(owner)
        .fetch_one(db)
        .await
        .context("Failed to insert course")
        .map_err(AppError::database)?;

        info!(course_id = %course.id, "Course created");
        Ok(course)
    }

    /// Loads the course and checks that `user_id` owns it.
    pub async fn owned_course(
        db: &PgPool,
        id: CourseId,
        user_id: UserId,
    ) -> Result<Course, AppError> {
        let course = Self::get_course(db, id).await?;
        if course.owner_user_id != user_id {
            warn!(course_id = %id, user_id = %user_id, "Course ownership check failed");
            return Err(AppError::forbidden(anyhow!(
                "Only the course owner can modify this course"
            )));
        }
        Ok(course)
    }

    /// Error for a guarded write that matched no row: the course vanished or
    /// changed owner after the ownership check.
    pub(crate) async fn write_refused(db: &PgPool, id: CourseId, user_id: UserId) -> AppError {
        match Self::owned_course(db, id, user_id).await {
            Err(err) => err,
            Ok(_) => AppError::not_found(anyhow!("Course not found")),
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn update_course(
        db: &PgPool,
        user_id: UserId,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        Self::owned_course(db, id, user_id).await?;

        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 estimation = COALESCE($4, estimation),
                 updated_at = NOW()
             WHERE id = $1 AND owner_user_id = $5
             RETURNING id, name, description, estimation, owner_user_id,
                       created_at, updated_at,
                       (SELECT COUNT(*) FROM lessons l WHERE l.course_id = courses.id) AS lesson_count",
        )
        .bind(id)
        .bind(dto.name)
        .bind(dto.description)
        .bind(dto.estimation)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to update course")
        .map_err(AppError::database)?;

        match course {
            Some(course) => Ok(course),
            None => Err(Self::write_refused(db, id, user_id).await),
        }
    }

    /// Deletes the course together with its lessons.
    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, user_id: UserId, id: CourseId) -> Result<(), AppError> {
        Self::owned_course(db, id, user_id).await?;

        let deleted = sqlx::query("DELETE FROM courses WHERE id = $1 AND owner_user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .context("Failed to delete course")
            .map_err(AppError::database)?
            .rows_affected();
        if deleted == 0 {
            return Err(Self::write_refused(db, id, user_id).await);
        }

        info!(course_id = %id, "Course deleted");
        Ok(())
    }
}
