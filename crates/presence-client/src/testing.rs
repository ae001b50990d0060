//! Recording fakes shared by the unit tests of this crate

use async_trait::async_trait;
use parking_lot::Mutex;
use presence_cache::{MemoryStore, MemoryUserCache};
use presence_common::PresenceConfig;
use presence_core::{
    CacheError, CacheMutation, CacheResult, CachedUser, DeferredTask, IdleScheduler,
    PresenceTransport, RequestParams, TransportResult, UserCache, UserId,
};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::services::ServiceContext;

pub fn uid(s: &str) -> UserId {
    UserId::parse(s).unwrap()
}

pub fn uids(ids: &[&str]) -> Vec<UserId> {
    ids.iter().map(|s| uid(s)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { endpoint: String, params: RequestParams },
    Subscribe { channel: String, args: Vec<Value> },
    SubscribeRaw { channel: String, payload: Value },
}

/// Transport that records every call and replays queued `get` responses
#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<TransportResult<Value>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: TransportResult<Value>) {
        self.responses.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn gets(&self) -> Vec<RequestParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Get { params, .. } => Some(params),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PresenceTransport for FakeTransport {
    async fn get(&self, endpoint: &str, params: &RequestParams) -> TransportResult<Value> {
        self.calls.lock().push(Call::Get {
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"success": true, "users": []})))
    }

    async fn subscribe(&self, channel: &str, args: &[Value]) -> TransportResult<()> {
        self.calls.lock().push(Call::Subscribe {
            channel: channel.to_string(),
            args: args.to_vec(),
        });
        Ok(())
    }

    async fn subscribe_raw(&self, channel: &str, payload: Value) -> TransportResult<()> {
        self.calls.lock().push(Call::SubscribeRaw {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }
}

/// Idle scheduler that holds tasks until the test releases them
#[derive(Default)]
pub struct ManualIdle {
    tasks: Mutex<Vec<DeferredTask>>,
}

impl ManualIdle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queued(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task();
        }
    }
}

impl IdleScheduler for ManualIdle {
    fn run_after_interactions(&self, task: DeferredTask) {
        self.tasks.lock().push(task);
    }
}

/// Cache wrapper whose writes fail for selected ids
pub struct FlakyCache {
    inner: MemoryUserCache,
    broken: HashSet<UserId>,
}

impl FlakyCache {
    pub fn new(broken: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryUserCache::new(),
            broken: broken.iter().map(|s| uid(s)).collect(),
        })
    }

    pub fn get(&self, id: &UserId) -> Option<CachedUser> {
        self.inner.get(id)
    }
}

#[async_trait]
impl UserCache for FlakyCache {
    async fn find(&self, id: &UserId) -> CacheResult<CachedUser> {
        self.inner.find(id).await
    }

    async fn write(&self, mutation: CacheMutation) -> CacheResult<()> {
        if self.broken.contains(mutation.id()) {
            return Err(CacheError::Write("disk full".to_string()));
        }
        self.inner.write(mutation).await
    }
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryUserCache>,
    pub idle: Arc<ManualIdle>,
    pub ctx: ServiceContext,
}

impl Harness {
    pub fn new(version: &str) -> Self {
        let transport = FakeTransport::new();
        let store = MemoryStore::new_shared();
        store.set_server_version(version);
        let cache = MemoryUserCache::new_shared();
        let idle = ManualIdle::new();

        let ctx = ServiceContext::new(
            transport.clone(),
            store.clone(),
            cache.clone(),
            idle.clone(),
            PresenceConfig::default(),
        );

        Self {
            transport,
            store,
            cache,
            idle,
            ctx,
        }
    }
}
