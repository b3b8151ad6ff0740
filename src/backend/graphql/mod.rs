//! GraphQL API
//!
//! The whole client-facing API is one GraphQL schema. Resolvers are split
//! by area and merged into a single `Query` and `Mutation` root:
//!
//! ```text
//! graphql/
//! ├── mod.rs            - Module exports
//! ├── schema.rs         - Schema, resolver context, current user
//! ├── types.rs          - User, Conversation, Message, plan objects
//! ├── users.rs          - me, users, login, refreshToken, register, verifyEmail
//! ├── chat.rs           - conversations, messages and their mutations
//! ├── subscriptions.rs  - subscriptionPlans, mySubscription, plan mutations
//! └── handler.rs        - Axum handlers for /graphql
//! ```
//!
//! Failures surface as GraphQL errors with a `code` extension
//! (`UNAUTHENTICATED`, `FORBIDDEN`, `NOT_FOUND`, `BAD_USER_INPUT`,
//! `LIMIT_EXCEEDED`, `INTERNAL_SERVER_ERROR`). Mutations whose result has a
//! `success` field report expected failures there instead.

pub mod chat;
pub mod handler;
pub mod schema;
pub mod subscriptions;
pub mod types;
pub mod users;

pub use handler::{graphiql, graphql_handler};
pub use schema::{build_schema, AppSchema, GraphQLContext};
