/// Network adapters for the npm registry
mod caching_registry;
mod npm_registry_client;

pub use caching_registry::{CachingRegistry, CatalogCache};
pub use npm_registry_client::{
    encode_package_name, NpmRegistryClient, DEFAULT_API_URL, DEFAULT_REGISTRY_TIMEOUT,
    DEFAULT_REGISTRY_URL,
};
