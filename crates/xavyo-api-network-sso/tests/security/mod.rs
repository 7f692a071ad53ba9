//! Security tests for the cross-domain handshake
//!
//! Every test drives the full middleware stack through an in-process
//! three-site network.

pub mod expiry_tests;
pub mod misconfiguration_tests;
pub mod phishing_tests;
pub mod replay_tests;
pub mod tamper_tests;
