use crate::domain::order::Order;
use crate::domain::payment::{NewPayment, Payment, PaymentId};
use crate::domain::ports::{OrderStore, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for payments, keyed by the payment's UUID bytes.
pub const CF_PAYMENTS: &str = "payments";
/// Index from acquirer remote id to payment id.
pub const CF_REMOTE_IDS: &str = "remote_ids";
/// Index from order id to payment id.
pub const CF_ORDER_PAYMENTS: &str = "order_payments";

/// A persistent store implementation using RocksDB.
///
/// Orders and payments live in separate Column Families as JSON documents.
/// Two index families resolve payments by remote id and by order; they are
/// updated in the same `WriteBatch` as the payment itself.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Serializes payment writes so the remote id check and the batch apply as one step.
    writes: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_ORDERS, CF_PAYMENTS, CF_REMOTE_IDS, CF_ORDER_PAYMENTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            writes: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, family: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn payment_id_at(&self, family: &str, key: &[u8]) -> Result<Option<PaymentId>> {
        let cf = self.cf(family)?;
        let Some(bytes) = self.db.get_pinned_cf(cf, key)? else {
            return Ok(None);
        };
        let id = uuid::Uuid::from_slice(&bytes).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Corrupt payment index entry: {}", e),
            )))
        })?;
        Ok(Some(PaymentId(id)))
    }

    fn write_payment(&self, payment: &Payment) -> Result<()> {
        let key = payment.id.0.as_bytes();
        let previous: Option<Payment> = self.read(CF_PAYMENTS, key)?;

        if !payment.remote_id.is_empty() {
            if let Some(owner) = self.payment_id_at(CF_REMOTE_IDS, payment.remote_id.as_bytes())? {
                if owner != payment.id {
                    return Err(PaymentError::ValidationError(format!(
                        "Remote id '{}' already belongs to another payment",
                        payment.remote_id
                    )));
                }
            }
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_PAYMENTS)?, key, encode(payment)?);
        batch.put_cf(self.cf(CF_ORDER_PAYMENTS)?, payment.order_id.as_bytes(), key);

        let remote_ids = self.cf(CF_REMOTE_IDS)?;
        if let Some(previous) = previous.filter(|p| p.remote_id != payment.remote_id) {
            if !previous.remote_id.is_empty() {
                batch.delete_cf(remote_ids, previous.remote_id.as_bytes());
            }
        }
        if !payment.remote_id.is_empty() {
            batch.put_cf(remote_ids, payment.remote_id.as_bytes(), key);
        }

        self.db.write(batch)?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        PaymentError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        self.read(CF_ORDERS, order_id.as_bytes())
    }

    async fn save(&self, order: Order) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        self.db.put_cf(cf, order.id.as_bytes(), encode(&order)?)?;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn create(&self, fields: NewPayment) -> Result<Payment> {
        let payment = Payment::from_new(PaymentId::generate(), fields);
        let _writes = self.writes.lock().await;
        self.write_payment(&payment)?;
        Ok(payment)
    }

    async fn save(&self, payment: Payment) -> Result<()> {
        let _writes = self.writes.lock().await;
        self.write_payment(&payment)
    }

    async fn load(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id.0.as_bytes())
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Payment>> {
        if remote_id.is_empty() {
            return Ok(None);
        }
        match self.payment_id_at(CF_REMOTE_IDS, remote_id.as_bytes())? {
            Some(id) => self.load(id).await,
            None => Ok(None),
        }
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<Payment>> {
        match self.payment_id_at(CF_ORDER_PAYMENTS, order_id.as_bytes())? {
            Some(id) => self.load(id).await,
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<Payment>> {
        let handle = self.cf(CF_PAYMENTS)?;

        let mut payments = Vec::new();
        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| {
                PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                    "RocksDB iteration error: {}",
                    e
                ))))
            })?;
            let payment: Payment = serde_json::from_slice(&value)?;
            payments.push(payment);
        }

        payments.sort_by(|a, b| a.order_id.cmp(&b.order_id).then(a.id.cmp(&b.id)));
        Ok(payments)
    }
}
