//! In-memory [`Database`](super::Database) for handler tests.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::roles::Role,
    bids::{
        repo::BidStore,
        repo_types::{Bid, BidStatus, NewBid},
    },
    transporters::{
        repo::TransporterStore,
        repo_types::{NewTransporter, Transporter},
    },
    users::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
};

#[derive(Default)]
pub struct MemoryDb {
    users: Mutex<Vec<User>>,
    transporters: Mutex<Vec<Transporter>>,
    bids: Mutex<Vec<Bid>>,
    calls: AtomicUsize,
    fail_user_insert: AtomicBool,
    bid_latency: Option<Duration>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `insert_user` fail, as a lost database connection would.
    pub fn failing_user_insert(self) -> Self {
        self.fail_user_insert.store(true, Ordering::SeqCst);
        self
    }

    /// Delays every `list_bids` call, as a stalled query would.
    pub fn slow_bids(mut self, latency: Duration) -> Self {
        self.bid_latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        self.touch();
        let mut users = self.users();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User> {
        self.touch();
        if self.fail_user_insert.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        let user = User {
            id: new.id,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> anyhow::Result<bool> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn update_user_role(&self, id: &str, role: Role) -> anyhow::Result<bool> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        Ok(match users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.role = role;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl TransporterStore for MemoryDb {
    async fn list_transporters(&self) -> anyhow::Result<Vec<Transporter>> {
        self.touch();
        let mut all = self.transporters.lock().unwrap().clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn create_transporter(&self, new: NewTransporter) -> anyhow::Result<Transporter> {
        self.touch();
        let t = Transporter {
            id: Uuid::new_v4(),
            name: new.name,
            contact: new.contact,
            vehicle_type: new.vehicle_type,
            capacity: new.capacity,
            status: new.status,
            created_at: OffsetDateTime::now_utc(),
        };
        self.transporters.lock().unwrap().push(t.clone());
        Ok(t)
    }

    async fn delete_transporter(&self, id: Uuid) -> anyhow::Result<bool> {
        self.touch();
        let mut all = self.transporters.lock().unwrap();
        let before = all.len();
        all.retain(|t| t.id != id);
        Ok(all.len() != before)
    }
}

#[async_trait]
impl BidStore for MemoryDb {
    async fn list_bids(&self) -> anyhow::Result<Vec<Bid>> {
        self.touch();
        if let Some(latency) = self.bid_latency {
            tokio::time::sleep(latency).await;
        }
        let mut all = self.bids.lock().unwrap().clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn create_bid(&self, new: NewBid) -> anyhow::Result<Bid> {
        self.touch();
        let bid = Bid {
            id: Uuid::new_v4(),
            material_type: new.material_type,
            quantity: new.quantity,
            pickup_location: new.pickup_location,
            delivery_location: new.delivery_location,
            deadline: new.deadline,
            transporter_requirements: new.transporter_requirements,
            status: new.status,
            created_at: OffsetDateTime::now_utc(),
        };
        self.bids.lock().unwrap().push(bid.clone());
        Ok(bid)
    }

    async fn delete_bid(&self, id: Uuid) -> anyhow::Result<bool> {
        self.touch();
        let mut all = self.bids.lock().unwrap();
        let before = all.len();
        all.retain(|b| b.id != id);
        Ok(all.len() != before)
    }

    async fn update_bid_status(&self, id: Uuid, status: BidStatus) -> anyhow::Result<Option<Bid>> {
        self.touch();
        let mut all = self.bids.lock().unwrap();
        Ok(all.iter_mut().find(|b| b.id == id).map(|b| {
            b.status = status;
            b.clone()
        }))
    }
}
