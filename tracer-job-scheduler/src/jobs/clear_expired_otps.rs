use tracer_common::db::auth::Dao as AuthDao;
use tracer_common::db::DbThreadPool;

use async_trait::async_trait;

use crate::jobs::{Job, JobError};

pub struct ClearExpiredOtpsJob {
    db_thread_pool: DbThreadPool,
    is_running: bool,
}

impl ClearExpiredOtpsJob {
    pub fn new(db_thread_pool: DbThreadPool) -> Self {
        Self {
            db_thread_pool,
            is_running: false,
        }
    }
}

#[async_trait]
impl Job for ClearExpiredOtpsJob {
    fn name(&self) -> &'static str {
        "Clear Expired Otps"
    }

    fn is_ready(&self) -> bool {
        !self.is_running
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        self.is_running = true;

        let dao = AuthDao::new(&self.db_thread_pool);
        let deleted_count =
            tokio::task::spawn_blocking(move || dao.delete_all_expired_otps()).await??;

        if deleted_count > 0 {
            log::info!("Deleted {} expired OTP record(s)", deleted_count);
        }

        self.is_running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracer_common::db::user;
    use tracer_common::models::password_reset_otp::NewPasswordResetOtp;
    use tracer_common::models::user::Role;
    use tracer_common::schema::password_reset_otps;

    use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
    use rand::Rng;
    use std::time::{Duration, SystemTime};

    use crate::env;

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_execute() {
        let user1_number = rand::thread_rng().gen_range::<u128, _>(u128::MIN..u128::MAX);
        let user2_number = rand::thread_rng().gen_range::<u128, _>(u128::MIN..u128::MAX);

        let user1_email = format!("test_user{}@test.com", &user1_number);
        let user2_email = format!("test_user{}@test.com", &user2_number);

        let user_dao = user::Dao::new(&env::testing::DB_THREAD_POOL);
        let user1_id = user_dao
            .create_user(&user1_email, "hash", Role::Alumnus)
            .unwrap();
        let user2_id = user_dao
            .create_user(&user2_email, "hash", Role::Alumnus)
            .unwrap();

        let now = SystemTime::now();

        let new_otp_exp = NewPasswordResetOtp {
            user_email: &user1_email,
            otp: "123456",
            created_timestamp: now - Duration::from_secs(1200),
            expiration: now - Duration::from_nanos(1),
            attempt_count: 0,
            max_attempts: 5,
            consumed: false,
        };

        diesel::insert_into(password_reset_otps::table)
            .values(&new_otp_exp)
            .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
            .unwrap();

        let new_otp_not_exp = NewPasswordResetOtp {
            user_email: &user2_email,
            otp: "654321",
            created_timestamp: now,
            expiration: now + Duration::from_secs(100),
            attempt_count: 0,
            max_attempts: 5,
            consumed: false,
        };

        diesel::insert_into(password_reset_otps::table)
            .values(&new_otp_not_exp)
            .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
            .unwrap();

        let mut job = ClearExpiredOtpsJob::new(env::testing::DB_THREAD_POOL.clone());
        job.execute().await.unwrap();

        assert_eq!(
            password_reset_otps::table
                .find(&user1_email)
                .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
                .unwrap(),
            0
        );

        assert_eq!(
            password_reset_otps::table
                .find(&user2_email)
                .filter(password_reset_otps::otp.eq("654321"))
                .execute(&mut env::testing::DB_THREAD_POOL.get().unwrap())
                .unwrap(),
            1
        );

        user_dao.delete_user(user1_id).unwrap();
        user_dao.delete_user(user2_id).unwrap();
    }
}
