#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use counter_server::auth::{sign_hs256, BearerAuth, Claims, ExpiryPolicy, TokenValidator};
use counter_server::error::DatabaseError;
use counter_server::{Counter, CounterStore};
use uuid::Uuid;

pub const SECRET: &[u8] = b"my-secret-key";

/// `CounterStore` over a map, following the Postgres statements' predicates.
#[derive(Default)]
pub struct InMemoryCounterStore {
    rows: Mutex<HashMap<Uuid, Counter>>,
}

impl InMemoryCounterStore {
    pub fn get(&self, id: Uuid) -> Option<Counter> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn create_counter(&self, name: &str) -> Result<Counter, DatabaseError> {
        let counter = Counter::new(name);
        self.rows.lock().unwrap().insert(counter.id, counter.clone());
        Ok(counter)
    }

    async fn increment_counter(&self, id: Uuid) -> Result<Counter, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(counter) if !counter.is_deleted() => {
                counter.value += 1;
                Ok(counter.clone())
            }
            _ => Err(DatabaseError::NotFound),
        }
    }

    async fn soft_delete_counter(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(counter) if !counter.is_deleted() => {
                counter.deleted_at = Some(Utc::now());
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

pub fn gate() -> BearerAuth {
    BearerAuth::new(Arc::new(TokenValidator::new(SECRET, ExpiryPolicy::Optional)))
}

/// A token valid for five minutes, signed with [`SECRET`].
pub fn valid_token() -> String {
    let claims = Claims::expiring_at(Utc::now() + Duration::minutes(5));
    sign_hs256(&claims, SECRET).unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
