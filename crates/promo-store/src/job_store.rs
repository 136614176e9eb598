//! Dual-layer job store.
//!
//! Live jobs are kept in an in-memory map for cheap status polling;
//! every write also lands in the SQLite `jobs` table so history
//! survives a restart. Reads go memory first, then the durable table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use promo_models::{Job, JobId, JobStatus, JobStep};
use rusqlite::{params, Row};
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

pub struct JobStore {
    memory: RwLock<HashMap<String, Job>>,
    db: Database,
}

impl JobStore {
    pub fn new(db: Database) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            db,
        }
    }

    /// Write a job to both layers, replacing any previous state.
    pub async fn save(&self, job: &Job) -> StoreResult<()> {
        {
            let mut memory = self.memory.write().await;
            memory.insert(job.id.as_str().to_string(), job.clone());
        }
        self.upsert_row(job)?;
        debug!(job_id = %job.id, status = %job.status, "Job saved");
        Ok(())
    }

    /// Fetch a job, preferring the in-memory copy.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        {
            let memory = self.memory.read().await;
            if let Some(job) = memory.get(id.as_str()) {
                return Ok(Some(job.clone()));
            }
        }
        self.find_row(id.as_str())
    }

    /// Most recent jobs, newest first.
    pub async fn list(&self, limit: u32) -> StoreResult<Vec<Job>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit], job_from_row)?;
            let mut jobs = Vec::new();
            for row in rows {
                jobs.push(row?);
            }
            Ok(jobs)
        })
    }

    /// Remove a job from both layers. Returns whether a durable row existed.
    pub async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        {
            let mut memory = self.memory.write().await;
            memory.remove(id.as_str());
        }
        self.db.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM jobs WHERE job_id = ?1", params![id.as_str()])?;
            Ok(changed > 0)
        })
    }

    fn upsert_row(&self, job: &Job) -> StoreResult<()> {
        let script_json = job
            .script
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jobs (job_id, product_name, status, step, step_name,
                 video_service, video_path, script, video_prompt, error,
                 add_subtitle, add_bgm, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(job_id) DO UPDATE SET
                   product_name=excluded.product_name, status=excluded.status,
                   step=excluded.step, step_name=excluded.step_name,
                   video_service=excluded.video_service, video_path=excluded.video_path,
                   script=excluded.script, video_prompt=excluded.video_prompt,
                   error=excluded.error, add_subtitle=excluded.add_subtitle,
                   add_bgm=excluded.add_bgm, updated_at=excluded.updated_at",
                params![
                    job.id.as_str(),
                    job.product_name,
                    job.status.as_str(),
                    job.step.index(),
                    job.step.label(),
                    job.backend.as_str(),
                    job.video_path,
                    script_json,
                    job.video_prompt,
                    job.error,
                    job.add_subtitle as i64,
                    job.add_bgm as i64,
                    job.created_at.to_rfc3339(),
                    job.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn find_row(&self, id: &str) -> StoreResult<Option<Job>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM jobs WHERE job_id = ?1")?;
            let mut rows = stmt.query_map(params![id], job_from_row)?;
            match rows.next() {
                Some(Ok(job)) => Ok(Some(job)),
                Some(Err(e)) => Err(StoreError::Sqlite(e)),
                None => Ok(None),
            }
        })
    }
}

fn job_from_row(row: &Row<'_>) -> Result<Job, rusqlite::Error> {
    let status: String = row.get("status")?;
    let step: i64 = row.get("step")?;
    let backend: String = row.get("video_service")?;
    let script: Option<String> = row.get("script")?;
    let add_subtitle: i64 = row.get("add_subtitle")?;
    let add_bgm: i64 = row.get("add_bgm")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Job {
        id: JobId::from_string(row.get::<_, String>("job_id")?),
        product_name: row.get("product_name")?,
        status: status.parse::<JobStatus>().unwrap_or_default(),
        step: JobStep::from_index(step as u8).unwrap_or_default(),
        backend: backend.parse().unwrap_or_default(),
        add_subtitle: add_subtitle != 0,
        add_bgm: add_bgm != 0,
        video_path: row.get("video_path")?,
        script: script.and_then(|s| serde_json::from_str(&s).ok()),
        video_prompt: row.get("video_prompt")?,
        error: row.get("error")?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_models::{BackendKind, ScriptScene, VideoScript};

    fn store() -> JobStore {
        JobStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = store();
        let job = Job::new("Smartwatch V8", BackendKind::Seedance, true, false);
        store.save(&job).await.unwrap();

        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.product_name, "Smartwatch V8");
        assert_eq!(loaded.status, JobStatus::Queued);
        assert!(loaded.add_subtitle);
        assert!(!loaded.add_bgm);
    }

    #[tokio::test]
    async fn test_get_falls_back_to_durable_row() {
        let db = Database::open_in_memory().unwrap();
        let store = JobStore::new(db.clone());
        let mut job = Job::new("Mug", BackendKind::Creatok, false, false);
        job.script = Some(VideoScript {
            hook: "Look".to_string(),
            scenes: vec![ScriptScene {
                duration: 3.0,
                description: "pan".to_string(),
                text: String::new(),
            }],
            cta: "Buy".to_string(),
        });
        store.save(&job).await.unwrap();

        // A fresh store over the same database has an empty memory layer.
        let restarted = JobStore::new(db);
        let loaded = restarted.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.backend, BackendKind::Creatok);
        assert_eq!(loaded.script.unwrap().hook, "Look");
    }

    #[tokio::test]
    async fn test_terminal_state_round_trips() {
        let store = store();
        let mut job = Job::new("Mug", BackendKind::Seedance, false, false);
        job.enter_step(JobStep::GenerateVideo);
        job.succeed("/out/mug.mp4");
        store.save(&job).await.unwrap();

        let loaded = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Success);
        assert_eq!(loaded.video_path.as_deref(), Some("/out/mug.mp4"));
        assert_eq!(loaded.step, JobStep::GenerateVideo);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = store();
        for name in ["first", "second", "third"] {
            let mut job = Job::new(name, BackendKind::Seedance, false, false);
            // Spread creation times so ordering is deterministic.
            job.created_at = Utc::now()
                + chrono::Duration::seconds(match name {
                    "first" => 0,
                    "second" => 1,
                    _ => 2,
                });
            store.save(&job).await.unwrap();
        }

        let jobs = store.list(2).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].product_name, "third");
        assert_eq!(jobs[1].product_name, "second");
    }

    #[tokio::test]
    async fn test_delete_removes_both_layers() {
        let store = store();
        let job = Job::new("Mug", BackendKind::Seedance, false, false);
        store.save(&job).await.unwrap();

        assert!(store.delete(&job.id).await.unwrap());
        assert!(store.get(&job.id).await.unwrap().is_none());
        // Second delete finds nothing.
        assert!(!store.delete(&job.id).await.unwrap());
    }
}
