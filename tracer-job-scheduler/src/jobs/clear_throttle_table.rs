use tracer_common::db::throttle::Dao as ThrottleDao;
use tracer_common::db::DbThreadPool;

use async_trait::async_trait;

use crate::jobs::{Job, JobError};

pub struct ClearThrottleTableJob {
    db_thread_pool: DbThreadPool,
    is_running: bool,
}

impl ClearThrottleTableJob {
    pub fn new(db_thread_pool: DbThreadPool) -> Self {
        Self {
            db_thread_pool,
            is_running: false,
        }
    }
}

#[async_trait]
impl Job for ClearThrottleTableJob {
    fn name(&self) -> &'static str {
        "Clear Throttle Table"
    }

    fn is_ready(&self) -> bool {
        !self.is_running
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        self.is_running = true;

        let mut dao = ThrottleDao::new(&self.db_thread_pool);
        tokio::task::spawn_blocking(move || dao.clear_throttle_table()).await??;

        self.is_running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracer_common::models::throttleable_attempt::NewThrottleableAttempt;
    use tracer_common::schema::throttleable_attempts;

    use diesel::{QueryDsl, RunQueryDsl};
    use rand::Rng;
    use std::time::{Duration, SystemTime};

    use crate::env;

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_execute() {
        let attempt = NewThrottleableAttempt {
            identifier_hash: rand::thread_rng().gen(),
            attempt_count: 3,
            expiration_timestamp: SystemTime::now() + Duration::from_secs(60),
        };

        diesel::insert_into(throttleable_attempts::table)
            .values(&attempt)
            .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
            .unwrap();

        let mut job = ClearThrottleTableJob::new(env::testing::DB_THREAD_POOL.clone());
        job.execute().await.unwrap();

        assert_eq!(
            throttleable_attempts::table
                .find(attempt.identifier_hash)
                .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
                .unwrap(),
            0
        );
    }
}
