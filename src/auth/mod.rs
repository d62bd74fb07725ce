//! Auth module for client-credentials token acquisition
//!
//! Provides one bearer token per API audience: the management API through the
//! legacy resource flow and Microsoft Graph through the v2.0 scope flow.

mod client_credentials;

pub use client_credentials::{
    BearerToken, ClientCredentials, ClientCredentialsAuthenticator, TokenAudience,
};
