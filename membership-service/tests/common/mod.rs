//! Shared test harness: services wired to in-memory collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use membership_service::gateway::MemoryGateway;
use membership_service::services::{ApprovalService, LoginService, MockEmailService};

pub const CODE_TTL_MINUTES: i64 = 10;
pub const RESEND_COOLDOWN_SECONDS: u64 = 60;

pub struct TestApp {
    pub gateway: Arc<MemoryGateway>,
    pub email: Arc<MockEmailService>,
    pub approval: ApprovalService,
    pub login: LoginService,
}

impl TestApp {
    pub fn new() -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        let email = Arc::new(MockEmailService::new());

        let approval = ApprovalService::new(gateway.clone());
        let login = LoginService::new(
            gateway.clone(),
            email.clone(),
            CODE_TTL_MINUTES,
            RESEND_COOLDOWN_SECONDS,
        );

        Self {
            gateway,
            email,
            approval,
            login,
        }
    }
}
