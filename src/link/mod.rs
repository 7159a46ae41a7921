//! Pub/sub message contract.
//!
//! The controller talks to the rest of the system over a topic-based
//! broker. This module owns the contract only: the topic names
//! ([`topics`]) and the payload codec ([`codec`]). Transport is an
//! adapter concern; the binary bridges an inbox of `(topic, payload)`
//! pairs through [`codec::decode`] and publishes whatever
//! [`codec::encode`] produces.

pub mod codec;
pub mod topics;
