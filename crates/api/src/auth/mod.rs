//! Bearer-token authentication.
//!
//! Users are provisioned by an external identity provider; this server only
//! validates the HS256 access tokens it issues. See [`jwt`].

pub mod jwt;
