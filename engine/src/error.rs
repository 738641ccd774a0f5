use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] mtw_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] mtw_store_lmdb::LmdbError),

    #[error("fetch error: {0}")]
    Fetch(#[from] mtw_fetch::FetchError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence queue is closed")]
    PersisterClosed,
}
