//! Client for the shop's gift-certificate REST API

pub mod client;
pub mod error;
pub mod model;

pub use client::{CertificateApi, Endpoint, HttpCertificateApi, ROUTE_PREFIX, TOKEN_HEADER};
pub use error::{ApiError, ApiResult};
pub use model::{
    parse_numeric, CertCode, CertRef, CertificateRecord, CertificateStatus, CreatedCertificate, JournalPage, Mutation,
    NewCertificate,
};
