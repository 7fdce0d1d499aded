use strata_core::{
    Namespace, Payload, Record, RecordBackend, Result, StoreError, Upserted, WideColumnConfig,
};

/// Wide-column record store
///
/// Opening performs no network I/O; the configuration is kept for when the
/// operations are implemented.
pub struct WideColumnStore {
    config: WideColumnConfig,
}

impl WideColumnStore {
    pub fn open(config: WideColumnConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(StoreError::Config(
                "wide-column backend needs at least one host".into(),
            ));
        }

        tracing::debug!(
            hosts = ?config.hosts,
            keyspace = %config.keyspace,
            "Configured wide-column backend"
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &WideColumnConfig {
        &self.config
    }

    fn unsupported<T>(&self, op: &str) -> Result<T> {
        Err(StoreError::NotImplemented(format!(
            "{} on wide-column keyspace '{}'",
            op, self.config.keyspace
        )))
    }
}

impl RecordBackend for WideColumnStore {
    fn name(&self) -> &'static str {
        "wide-column"
    }

    fn create_table(&self) -> Result<()> {
        self.unsupported("create_table")
    }

    fn drop_table(&self) -> Result<()> {
        self.unsupported("drop_table")
    }

    fn insert(&self, _record: &Record) -> Result<()> {
        self.unsupported("insert")
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        self.unsupported("read_all")
    }

    fn read_by_id(&self, _id: &str) -> Result<Record> {
        self.unsupported("read_by_id")
    }

    fn upsert_by_namespace(
        &self,
        _ns: Namespace,
        _id: &str,
        _payload: Payload,
    ) -> Result<Upserted> {
        self.unsupported("upsert_by_namespace")
    }
}
