use diesel::{dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbThreadPool};
use crate::models::user::{NewUser, Role, User};
use crate::schema::users as user_fields;
use crate::schema::users::dsl::users;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    pub fn get_user_by_email(&self, user_email: &str) -> Result<User, DaoError> {
        Ok(users
            .filter(user_fields::email.eq(user_email))
            .get_result::<User>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_user(
        &self,
        user_email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Uuid, DaoError> {
        let user_id = Uuid::now_v7();

        let new_user = NewUser {
            id: user_id,
            email: user_email,
            password_hash,
            role: role.as_str(),
            created_timestamp: SystemTime::now(),
        };

        dsl::insert_into(users)
            .values(&new_user)
            .execute(&mut self.db_thread_pool.get()?)?;

        Ok(user_id)
    }

    pub fn update_password_hash(
        &self,
        user_email: &str,
        password_hash: &str,
    ) -> Result<(), DaoError> {
        let affected_rows = dsl::update(users.filter(user_fields::email.eq(user_email)))
            .set(user_fields::password_hash.eq(password_hash))
            .execute(&mut self.db_thread_pool.get()?)?;

        if affected_rows == 0 {
            return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
        }

        Ok(())
    }

    pub fn delete_user(&self, user_id: Uuid) -> Result<(), DaoError> {
        diesel::delete(users.find(user_id)).execute(&mut self.db_thread_pool.get()?)?;

        Ok(())
    }
}
