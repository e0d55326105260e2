mod http_retrieval_client;

pub use http_retrieval_client::HttpRetrievalClient;
