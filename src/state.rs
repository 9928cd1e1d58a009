//! Application state shared by every handler through an `Extension`.
//!
//! Each mutable component sits behind its own lock. A mutation builds the
//! next value, persists it, and only then replaces the in-memory copy, so a
//! failed write leaves both memory and disk as they were.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::directory::Directory;
use crate::err::Error;
use crate::ledger::{Ledger, Status};
use crate::models::{Account, Session};
use crate::store::{Store, ACCOUNTS_KEY, ATTENDANCE_KEY, SESSIONS_KEY};

#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: Store,
    directory: Directory,
    session_ttl: Duration,
    ledger: RwLock<Ledger>,
    accounts: RwLock<Vec<Account>>,
    sessions: RwLock<BTreeMap<String, Session>>,
}

impl AppState {
    /// Rebuilds the ledger, account registry and session table from `store`.
    pub async fn load(
        store: Store,
        directory: Directory,
        session_ttl: Duration,
    ) -> anyhow::Result<Self> {
        let ledger: Ledger = store.load(ATTENDANCE_KEY).await?;
        let accounts: Vec<Account> = store.load(ACCOUNTS_KEY).await?;
        let mut sessions: BTreeMap<String, Session> = store.load(SESSIONS_KEY).await?;
        let now = Utc::now();
        sessions.retain(|_, session| !session.is_expired(now));
        log::info!(
            "Loaded {} attendance marks, {} accounts and {} sessions from {}",
            ledger.len(),
            accounts.len(),
            sessions.len(),
            store.root().display()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                directory,
                session_ttl,
                ledger: RwLock::new(ledger),
                accounts: RwLock::new(accounts),
                sessions: RwLock::new(sessions),
            }),
        })
    }

    pub fn directory(&self) -> &Directory {
        &self.inner.directory
    }

    pub fn session_ttl(&self) -> Duration {
        self.inner.session_ttl
    }

    pub async fn ledger(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.ledger.read().await
    }

    /// Records a mark and flushes the ledger. Returns the status it replaced.
    pub async fn mark_attendance(
        &self,
        date: NaiveDate,
        student: Uuid,
        status: Status,
    ) -> Result<Option<Status>, Error> {
        let mut ledger = self.inner.ledger.write().await;
        let mut next = ledger.clone();
        let previous = next.mark(date, student, status);
        self.inner.store.save(ATTENDANCE_KEY, &next).await?;
        *ledger = next;
        Ok(previous)
    }

    pub async fn accounts(&self) -> RwLockReadGuard<'_, Vec<Account>> {
        self.inner.accounts.read().await
    }

    /// Appends `account` unless its email is taken. Returns whether it was added.
    pub async fn append_account(&self, account: Account) -> Result<bool, Error> {
        let mut accounts = self.inner.accounts.write().await;
        if accounts.iter().any(|existing| existing.email == account.email) {
            return Ok(false);
        }
        let mut next = accounts.clone();
        next.push(account);
        self.inner.store.save(ACCOUNTS_KEY, &next).await?;
        *accounts = next;
        Ok(true)
    }

    pub async fn session(&self, ssid: &str) -> Option<Session> {
        self.inner.sessions.read().await.get(ssid).cloned()
    }

    /// Stores `session` and sweeps every expired one.
    pub async fn insert_session(&self, session: Session) -> Result<(), Error> {
        let mut sessions = self.inner.sessions.write().await;
        let mut next = sessions.clone();
        let now = Utc::now();
        next.retain(|_, existing| !existing.is_expired(now));
        next.insert(session.ssid.clone(), session);
        self.inner.store.save(SESSIONS_KEY, &next).await?;
        *sessions = next;
        Ok(())
    }

    /// Returns the removed session, if there was one.
    pub async fn remove_session(&self, ssid: &str) -> Result<Option<Session>, Error> {
        let mut sessions = self.inner.sessions.write().await;
        if !sessions.contains_key(ssid) {
            return Ok(None);
        }
        let mut next = sessions.clone();
        let removed = next.remove(ssid);
        self.inner.store.save(SESSIONS_KEY, &next).await?;
        *sessions = next;
        Ok(removed)
    }
}
