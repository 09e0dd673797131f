/// PostgreSQL store
///
/// sqlx-backed implementation of [`Store`]. Enum columns are stored as their wire
/// labels in `VARCHAR` columns and decoded through intermediate row types, so a
/// corrupt label surfaces as `StoreError::Database` rather than a panic.
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskflow_shared::store::{PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let users = store.list_users().await?;
/// println!("{} users", users.len());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    CreateProject, CreateUser, NewTask, Project, ProjectMember, ProjectRole, Task, UpdateProject,
    UpdateTask, User,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, system_role, created_at";

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";

const TASK_SELECT: &str = r#"
    SELECT t.id, t.project_id, t.user_id, t.title, t.description, t.status, t.priority,
           t.due_date, t.assigned_to, t.created_at, t.updated_at,
           u.name AS assignee_name, u.email AS assignee_email
    FROM tasks t
    LEFT JOIN users u ON t.assigned_to = u.id
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    system_role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            system_role: row
                .system_role
                .parse()
                .map_err(|e| StoreError::Database(format!("{e}")))?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
}

impl TryFrom<MemberRow> for ProjectMember {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(ProjectMember {
            id: row.id,
            project_id: row.project_id,
            user_id: row.user_id,
            role: parse_role(&row.role)?,
            joined_at: row.joined_at,
            user_name: row.user_name,
            user_email: row.user_email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    status: String,
    priority: String,
    due_date: Option<NaiveDate>,
    assigned_to: Option<Uuid>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            project_id: row.project_id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::Database(format!("{e}")))?,
            priority: row
                .priority
                .parse()
                .map_err(|e| StoreError::Database(format!("{e}")))?,
            due_date: row.due_date,
            assigned_to: row.assigned_to,
            assignee_name: row.assignee_name,
            assignee_email: row.assignee_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_role(label: &str) -> StoreResult<ProjectRole> {
    label
        .parse()
        .map_err(|e| StoreError::Database(format!("{e}")))
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// `Store` backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, name, system_role, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.name)
            .bind(input.system_role.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("user"))?
            .try_into()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("user"))?
            .try_into()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent owner grants until we commit
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("user"));
        }

        let owns_projects = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM project_members WHERE user_id = $1 AND role = $2)",
        )
        .bind(id)
        .bind(ProjectRole::Owner.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if owns_projects {
            return Err(StoreError::Conflict(format!("user {} still owns projects", id)));
        }

        sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM project_members WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::NotFound("user"));
        }

        tx.commit().await?;

        tracing::info!(user_id = %id, "Deleted user with tasks and memberships");
        Ok(())
    }

    async fn create_project_with_owner(
        &self,
        input: CreateProject,
        owner_id: Uuid,
    ) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO projects (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (id, project_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project.id)
        .bind(owner_id)
        .bind(ProjectRole::Owner.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Project> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("project"))
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC");

        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.created_at, p.updated_at
            FROM projects p
            INNER JOIN project_members pm ON p.id = pm.project_id
            WHERE pm.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, input: UpdateProject) -> StoreResult<Project> {
        let sql = format!(
            "UPDATE projects \
             SET name = COALESCE($1, name), description = COALESCE($2, description), updated_at = NOW() \
             WHERE id = $3 RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(input.name)
            .bind(input.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("project"))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("project"));
        }
        Ok(())
    }

    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<ProjectRole> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        parse_role(&role.ok_or(StoreError::NotFound("membership"))?)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT pm.id, pm.project_id, pm.user_id, pm.role, pm.joined_at,
                   u.name AS user_name, u.email AS user_email
            FROM project_members pm
            INNER JOIN users u ON pm.user_id = u.id
            WHERE pm.project_id = $1
            ORDER BY pm.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn upsert_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO project_members (id, project_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (project_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE project_members SET role = $1 WHERE project_id = $2 AND user_id = $3",
        )
        .bind(role.as_str())
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_task(&self, input: NewTask) -> StoreResult<Task> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (id, project_id, user_id, title, description, status, priority,
                               due_date, assigned_to, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.project_id)
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.as_str())
        .bind(input.priority.as_str())
        .bind(input.due_date)
        .bind(input.assigned_to)
        .fetch_one(&self.pool)
        .await?;

        self.get_task(id).await
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Task> {
        let sql = format!("{TASK_SELECT} WHERE t.id = $1");

        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("task"))?
            .try_into()
    }

    async fn list_tasks_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!("{TASK_SELECT} WHERE t.user_id = $1 ORDER BY t.created_at DESC");

        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!("{TASK_SELECT} WHERE t.project_id = $1 ORDER BY t.created_at DESC");

        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn update_task(&self, id: Uuid, owner_id: Uuid, input: UpdateTask) -> StoreResult<Task> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE tasks
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                status = COALESCE($3, status),
                priority = COALESCE($4, priority),
                due_date = CASE WHEN $5 THEN $6 ELSE due_date END,
                assigned_to = CASE WHEN $7 THEN $8 ELSE assigned_to END,
                updated_at = NOW()
            WHERE id = $9 AND user_id = $10
            RETURNING id
            "#,
        )
        .bind(input.title)
        .bind(input.description)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.priority.map(|p| p.as_str()))
        .bind(input.due_date.is_some())
        .bind(input.due_date.flatten())
        .bind(input.assigned_to.is_some())
        .bind(input.assigned_to.flatten())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get_task(id).await,
            None => Err(StoreError::NotFound("task")),
        }
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
