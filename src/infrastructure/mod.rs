//! Infrastructure module for external services.
//!
//! This module contains the repository traits and their in-memory and
//! `PostgreSQL` implementations, backend selection, password hashing and
//! token signing.

pub mod factory;
pub mod in_memory;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod token;

pub use factory::{
    ConfigurationError, FactoryError, Repositories, RepositoryConfig, RepositoryFactory,
    StorageMode,
};
pub use in_memory::{
    InMemoryDatabase, InMemoryDoneEntryRepository, InMemoryTaskRepository, InMemoryUserRepository,
};
pub use password::{PasswordError, hash_password, verify_dummy_password, verify_password};
pub use postgres::{
    PostgresDoneEntryRepository, PostgresTaskRepository, PostgresUserRepository, run_migrations,
};
pub use repository::{
    DoneEntryRepository, ReorderOutcome, RepositoryError, TaskRepository, UserRepository,
};
pub use token::{AuthConfig, Claims, TokenError, TokenKind, TokenPair, TokenSigner};
