//! Handles shared between the application and the session task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::futures::Notified;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

use crate::database::Database;
use crate::error::{Dnp3Error, Result};

/// Control messages sent to the session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Message {
    Shutdown,
}

/// Shared access to the point database.
///
/// Every transaction runs under one lock, so a response is assembled either
/// before or after a transaction, never in the middle of one.
#[derive(Debug, Clone)]
pub struct DatabaseHandle {
    inner: Arc<Mutex<Database>>,
    notify: Arc<Notify>,
}

impl DatabaseHandle {
    pub(crate) fn new(database: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(database)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Run a batch of operations with exclusive access to the database.
    ///
    /// The session task is woken afterwards to consider unsolicited responses.
    ///
    /// ```rust,ignore
    /// handle.transaction(|db| {
    ///     db.update(BinaryInput::without_time(0, true, Flags::ONLINE), UpdateOptions::default())
    /// })?;
    /// ```
    pub fn transaction<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Database) -> R,
    {
        let result = {
            let mut database = self.lock();
            f(&mut database)
        };
        self.notify.notify_one();
        result
    }

    /// Run a batch that either applies completely or not at all.
    ///
    /// If `f` returns an error the database, including its event buffer, is
    /// restored to the state before the call.
    pub fn try_transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Database) -> std::result::Result<T, E>,
    {
        let result = {
            let mut database = self.lock();
            let snapshot = database.clone();
            let result = f(&mut database);
            if result.is_err() {
                debug!("Transaction failed, database restored");
                *database = snapshot;
            }
            result
        };
        if result.is_ok() {
            self.notify.notify_one();
        }
        result
    }

    /// Lock the database, recovering a poisoned lock.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Database> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completes after the next transaction.
    pub(crate) fn updated(&self) -> Notified<'_> {
        self.notify.notified()
    }
}

/// Handle to a running outstation.
#[derive(Debug, Clone)]
pub struct OutstationHandle {
    database: DatabaseHandle,
    tx: mpsc::Sender<Message>,
}

impl OutstationHandle {
    pub(crate) fn new(database: DatabaseHandle, tx: mpsc::Sender<Message>) -> Self {
        Self { database, tx }
    }

    /// Shared database of the outstation.
    pub fn database(&self) -> &DatabaseHandle {
        &self.database
    }

    /// See [`DatabaseHandle::transaction`].
    pub fn transaction<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Database) -> R,
    {
        self.database.transaction(f)
    }

    /// See [`DatabaseHandle::try_transaction`].
    pub fn try_transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Database) -> std::result::Result<T, E>,
    {
        self.database.try_transaction(f)
    }

    /// Stop the session task. `OutstationTask::run` returns `Dnp3Error::Shutdown`.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Message::Shutdown)
            .await
            .map_err(|_| Dnp3Error::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::UpdateOptions;
    use crate::event::EventBufferConfig;
    use crate::types::{BinaryInput, Counter, EventClass, Flags, PointType};

    fn handle() -> DatabaseHandle {
        let mut db = Database::new(EventBufferConfig::default()).unwrap();
        db.add_binary_input(0, Some(EventClass::Class1), Default::default())
            .unwrap();
        db.add_counter(0, Some(EventClass::Class2), Default::default())
            .unwrap();
        DatabaseHandle::new(db)
    }

    #[test]
    fn test_transaction_applies_batch() {
        let handle = handle();
        let changed = handle.transaction(|db| {
            db.update(
                BinaryInput::without_time(0, true, Flags::ONLINE),
                UpdateOptions::default(),
            )
        });
        assert!(changed.unwrap());
        assert!(handle.lock().get_binary_input(0).unwrap().value);
        assert_eq!(handle.lock().events().len(), 1);
    }

    #[test]
    fn test_try_transaction_rolls_back() {
        let handle = handle();
        let result: Result<()> = handle.try_transaction(|db| {
            db.update(
                Counter::without_time(0, 10, Flags::ONLINE),
                UpdateOptions::default(),
            )?;
            db.update(
                BinaryInput::without_time(7, true, Flags::ONLINE),
                UpdateOptions::default(),
            )?;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(Dnp3Error::UnknownIndex {
                point_type: PointType::BinaryInput,
                index: 7
            })
        ));
        let db = handle.lock();
        assert_eq!(db.get_counter(0).unwrap().value, 0);
        assert!(db.events().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_notifies() {
        let handle = handle();
        handle.transaction(|_| ());
        // permit stored without a waiter
        tokio::time::timeout(std::time::Duration::from_secs(1), handle.updated())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_after_task_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let handle = OutstationHandle::new(handle(), tx);
        drop(rx);
        assert!(matches!(
            handle.shutdown().await,
            Err(Dnp3Error::ChannelClosed)
        ));
    }
}
