//! Classifier service client

mod client;

pub use client::ClassifierApiClient;
